//! Reference rule catalog for sieve
//!
//! Each rule is a stateless unit implementing [`Rule`](sieve_schema::Rule).
//! [`catalog`] registers all of them under their conventional names:
//!
//! | name | checks |
//! |---|---|
//! | `string`, `number`, `boolean`, `date` | scalar type |
//! | `object`, `array` | container shape |
//! | `optional` | tolerates absence (no-op otherwise) |
//! | `required` | present and not null |
//! | `min_length`, `max_length` | text length in chars, or array length |
//! | `min`, `max` | numeric bounds (inclusive) |
//! | `in` | membership in a fixed list |
//! | `regex`, `email`, `url` | text formats |

mod args;
mod bounds;
mod format;
mod presence;
mod types;

pub use bounds::{InRule, MaxLengthRule, MaxRule, MinLengthRule, MinRule};
pub use format::{EmailRule, RegexRule, UrlRule};
pub use presence::{OptionalRule, RequiredRule};
pub use types::{
    ArrayRule, BooleanRule, DateRule, NumberRule, ObjectRule, StringRule, is_plain_object,
};

use sieve_schema::Registry;

/// Registry holding every rule in this crate.
pub fn catalog() -> Registry {
    Registry::new()
        .with("string", StringRule)
        .with("number", NumberRule)
        .with("boolean", BooleanRule)
        .with("date", DateRule)
        .with("object", ObjectRule)
        .with("array", ArrayRule)
        .with("optional", OptionalRule)
        .with("required", RequiredRule)
        .with("min_length", MinLengthRule)
        .with("max_length", MaxLengthRule)
        .with("min", MinRule)
        .with("max", MaxRule)
        .with("in", InRule)
        .with("regex", RegexRule)
        .with("email", EmailRule)
        .with("url", UrlRule)
}
