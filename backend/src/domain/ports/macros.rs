//! Helper macro for generating domain port error enums.
//!
//! Every persistence port distinguishes connection failures from query
//! failures so services can map them to distinct response codes. The macro
//! generates the enum, its `thiserror` display strings, and snake_case
//! constructors accepting anything `Into<String>`.

macro_rules! define_port_error {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant { message: String },
            )*
        }

        impl $name {
            ::paste::paste! {
                $(
                    pub fn [<$variant:snake>](message: impl Into<String>) -> Self {
                        Self::$variant { message: message.into() }
                    }
                )*
            }
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    define_port_error! {
        pub enum ExamplePortError {
            Connection => "connection failed: {message}",
            Query => "query failed: {message}",
        }
    }

    #[test]
    fn constructors_accept_str() {
        let err = ExamplePortError::connection("refused");
        assert_eq!(err.to_string(), "connection failed: refused");
    }

    #[test]
    fn variants_compare_by_payload() {
        assert_eq!(
            ExamplePortError::query("boom"),
            ExamplePortError::Query {
                message: "boom".into()
            }
        );
    }
}
