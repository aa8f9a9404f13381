use aliri_braid::braid;
use std::fmt;

macro_rules! redacted {
    ($ty:ty: $hidden:literal) => {
        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str(concat!("***", $hidden, "***"))
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str(concat!("***", $hidden, "***"))
            }
        }
    };
}

/// A Jira username
#[braid(serde)]
pub struct Username;

/// A password
///
/// Formatting never reveals the underlying value. Use
/// [`as_str()`][PasswordRef::as_str] where the plain text is
/// actually required.
#[braid(serde, debug = "owned", display = "owned")]
pub struct Password;

redacted!(PasswordRef: "PASSWORD");
