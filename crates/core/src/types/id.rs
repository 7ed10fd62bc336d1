//! Newtype ids for the four stored relations.
//!
//! Every row id is a Postgres `SERIAL`, so the wrappers sit on `i32`. Keeping
//! them as distinct types stops a shop id from being handed to a terminal
//! lookup by accident.

/// Define a type-safe row id.
///
/// The generated type is `Copy`, serializes as a bare integer, parses from a
/// decimal string (admin form fields arrive as text) and, with the `postgres`
/// feature, binds and decodes as `INT4`.
///
/// ```rust
/// # use receetly_core::define_id;
/// define_id!(DrawerId);
///
/// let id: DrawerId = "42".parse().unwrap();
/// assert_eq!(id.as_i32(), 42);
/// assert!("forty-two".parse::<DrawerId>().is_err());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Wrap a raw row id.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// The raw row id.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse::<i32>().map(Self)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                <i32 as ::sqlx::Decode<::sqlx::Postgres>>::decode(value).map(Self)
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <i32 as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

define_id!(MerchantId);
define_id!(ShopId);
define_id!(TerminalId);
define_id!(ReceiptId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_form_input() {
        let id: ShopId = " 7 ".parse().unwrap();
        assert_eq!(id, ShopId::new(7));
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert!("".parse::<MerchantId>().is_err());
        assert!("abc".parse::<MerchantId>().is_err());
    }

    #[test]
    fn test_serializes_as_bare_integer() {
        let json = serde_json::to_string(&TerminalId::new(12)).unwrap();
        assert_eq!(json, "12");
    }

    #[test]
    fn test_receipt_ids_order_by_insertion() {
        assert!(ReceiptId::new(2) > ReceiptId::new(1));
    }
}
