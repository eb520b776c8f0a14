//! Macro for implementing Display and FromStr for wire-named enums
//!
//! Enums that cross a process boundary (HTTP verbs, endpoint roles, event
//! names) need one canonical spelling on output and forgiving parsing on
//! input. This macro generates both from a single variant table.
//!
//! # Example
//!
//! ```rust
//! use tether_domain::impl_wire_name_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Tier {
//!     Gold,
//!     Silver,
//! }
//!
//! impl_wire_name_conversions!(Tier {
//!     Gold => "gold",
//!     Silver => "silver",
//! });
//!
//! assert_eq!(Tier::Gold.to_string(), "gold");
//! assert_eq!("SILVER".parse::<Tier>().unwrap(), Tier::Silver);
//! ```

/// Implements Display and FromStr for enums with a fixed wire spelling
///
/// - Display writes the string exactly as given in the table
/// - FromStr compares ASCII case-insensitively and trims whitespace
#[macro_export]
macro_rules! impl_wire_name_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = $crate::errors::TetherError;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                let candidate = s.trim();
                $(
                    if candidate.eq_ignore_ascii_case($str) {
                        return Ok(Self::$variant);
                    }
                )+
                Err($crate::errors::TetherError::InvalidInput(format!(
                    "Invalid {}: {}",
                    stringify!($enum_name),
                    s
                )))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Verb {
        Get,
        Post,
    }

    impl_wire_name_conversions!(Verb {
        Get => "GET",
        Post => "POST",
    });

    #[test]
    fn display_uses_table_spelling() {
        assert_eq!(Verb::Get.to_string(), "GET");
        assert_eq!(Verb::Post.to_string(), "POST");
    }

    #[test]
    fn parsing_ignores_case_and_whitespace() {
        assert_eq!(Verb::from_str("get").unwrap(), Verb::Get);
        assert_eq!(Verb::from_str(" Post ").unwrap(), Verb::Post);
    }

    #[test]
    fn parsing_rejects_unknown_names() {
        let err = Verb::from_str("TRACE").unwrap_err();
        assert!(err.to_string().contains("Invalid Verb: TRACE"));
        assert!(Verb::from_str("").is_err());
    }
}
