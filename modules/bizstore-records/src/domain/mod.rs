//! Business entities.
//!
//! Each entity module declares the stored record, its lite projection, its
//! sort allow-list and its typed list filter. Narrow list-by-reference helpers
//! live on `...Ext` traits implemented for `Collection<Entity>`.

/// Declare a sort allow-list enum and its `SortField` impl.
macro_rules! sort_fields {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($variant:ident => ($field:expr, $kind:ident)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($variant),+
        }

        impl bizstore_query::SortField for $name {
            const FIELDS: &'static [Self] = &[$($name::$variant),+];

            fn name(&self) -> &'static str {
                match self {
                    $($name::$variant => $field),+
                }
            }

            #[allow(clippy::match_same_arms)]
            fn kind(&self) -> bizstore_query::SortKind {
                match self {
                    $($name::$variant => bizstore_query::SortKind::$kind),+
                }
            }
        }
    };
}

pub mod associate;
pub mod attachment;
pub mod bulletin;
pub mod comment;
pub mod customer;
pub mod fields;
pub mod order;
pub mod owner;
pub mod skill_set;
pub mod staff;
pub mod tag;
pub mod task_item;
pub mod tenant;
pub mod user;

use bizstore_query::ObjectId;
use serde::{Deserialize, Serialize};

/// Embedded reference to a tag, denormalized with its display text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRef {
    pub id: ObjectId,
    pub text: String,
}

/// Embedded reference to a skill set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillSetRef {
    pub id: ObjectId,
    pub sub_category: String,
}

/// `"Last, First"`, the form people are ordered by.
#[must_use]
pub fn lexical_name(first_name: &str, last_name: &str) -> String {
    match (first_name.is_empty(), last_name.is_empty()) {
        (true, _) => last_name.to_owned(),
        (false, true) => first_name.to_owned(),
        (false, false) => format!("{last_name}, {first_name}"),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn lexical_name_puts_last_name_first() {
        assert_eq!(lexical_name("Jane", "Doe"), "Doe, Jane");
        assert_eq!(lexical_name("", "Doe"), "Doe");
        assert_eq!(lexical_name("Jane", ""), "Jane");
    }
}
