use std::fmt;

/// One entry of the address book.
///
/// Every field is kept exactly as written in the file, the port included: it
/// is handed to `ssh -p` verbatim.
#[derive(Clone, PartialEq, Eq)]
pub struct LoginRecord {
    pub name: String,
    pub address: String,
    pub user: String,
    pub password: String,
    pub port: String,
    pub comment: String,
}

// Records end up in log lines; never print the password there.
impl fmt::Debug for LoginRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRecord")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("port", &self.port)
            .field("comment", &self.comment)
            .finish()
    }
}

impl LoginRecord {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        port: impl Into<String>,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            user: user.into(),
            password: password.into(),
            port: port.into(),
            comment: comment.into(),
        }
    }

    /// `user@address:port`, used for log lines.
    pub fn target(&self) -> String {
        format!("{}@{}:{}", self.user, self.address, self.port)
    }
}
