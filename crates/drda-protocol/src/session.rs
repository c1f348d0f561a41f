//! Per-connection session configuration.
//!
//! A [`SessionConfig`] captures every dialect-dependent decision (character
//! encoding, byte order, security mechanism, credentials) once, before the
//! handshake. Builders and decoders read from it and never mutate it.

use std::fmt;
use std::str::FromStr;

use crate::codepoint::param;
use crate::encoding::{ByteOrder, Encoding};
use crate::error::ProtocolError;

/// Width of the fixed RDBNAM field.
pub const RDB_NAME_LENGTH: usize = 18;

/// User id sent to Derby servers.
pub const DERBY_USER: &str = "APP";

/// Server dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// Apache Derby network server.
    Derby,
    /// IBM Db2.
    Db2,
}

impl Dialect {
    /// Choose a dialect when none is given: Derby without a user, Db2 with one.
    #[must_use]
    pub fn resolve(explicit: Option<Self>, user: Option<&str>) -> Self {
        match (explicit, user) {
            (Some(dialect), _) => dialect,
            (None, None) => Self::Derby,
            (None, Some(_)) => Self::Db2,
        }
    }

    /// Character encoding for strings and character data.
    #[must_use]
    pub const fn encoding(self) -> Encoding {
        match self {
            Self::Derby => Encoding::Utf8,
            Self::Db2 => Encoding::Cp500,
        }
    }

    /// Byte order for numeric and length fields in data.
    #[must_use]
    pub const fn byte_order(self) -> ByteOrder {
        match self {
            Self::Derby => ByteOrder::BigEndian,
            Self::Db2 => ByteOrder::LittleEndian,
        }
    }

    /// Package section number used in PKGNAMCSN.
    #[must_use]
    pub const fn package_section(self) -> u16 {
        match self {
            Self::Derby => 65,
            Self::Db2 => 1,
        }
    }

    /// Lower-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Derby => "derby",
            Self::Db2 => "db2",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a dialect name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown database dialect: {0:?}")]
pub struct UnknownDialect(pub String);

impl FromStr for Dialect {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "derby" => Ok(Self::Derby),
            "db2" => Ok(Self::Db2),
            _ => Err(UnknownDialect(s.to_string())),
        }
    }
}

/// Security mechanism negotiated in ACCSEC/SECCHK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecurityMechanism {
    /// User id and clear-text password.
    UserIdPassword,
    /// User id only.
    UserIdOnly,
}

impl SecurityMechanism {
    /// The SECMEC code sent on the wire.
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::UserIdPassword => param::SECMEC_USRIDPWD,
            Self::UserIdOnly => param::SECMEC_USRIDONL,
        }
    }
}

/// Immutable per-session protocol settings.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionConfig {
    dialect: Dialect,
    security: SecurityMechanism,
    database: String,
    rdb_name: Vec<u8>,
    user: String,
    password: String,
}

impl SessionConfig {
    /// Build the session settings for a database and optional credentials.
    ///
    /// Derby sessions always authenticate as `APP` with an empty password;
    /// Db2 sessions use the supplied credentials.
    pub fn new(
        dialect: Dialect,
        database: &str,
        user: Option<&str>,
        password: Option<&str>,
    ) -> Result<Self, ProtocolError> {
        let (security, user, password) = match dialect {
            Dialect::Derby => (SecurityMechanism::UserIdOnly, DERBY_USER.to_string(), String::new()),
            Dialect::Db2 => (
                SecurityMechanism::UserIdPassword,
                user.unwrap_or_default().to_string(),
                password.unwrap_or_default().to_string(),
            ),
        };
        let rdb_name = dialect
            .encoding()
            .encode_fixed(database, RDB_NAME_LENGTH)?;

        Ok(Self {
            dialect,
            security,
            database: database.to_string(),
            rdb_name,
            user,
            password,
        })
    }

    /// Server dialect.
    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Character encoding of the session.
    #[must_use]
    pub fn encoding(&self) -> Encoding {
        self.dialect.encoding()
    }

    /// Byte order of numeric data fields.
    #[must_use]
    pub fn byte_order(&self) -> ByteOrder {
        self.dialect.byte_order()
    }

    /// Security mechanism.
    #[must_use]
    pub fn security(&self) -> SecurityMechanism {
        self.security
    }

    /// Database name as configured.
    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Encoded RDBNAM, padded or truncated to 18 bytes.
    #[must_use]
    pub fn rdb_name(&self) -> &[u8] {
        &self.rdb_name
    }

    /// User id sent in SECCHK.
    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Password sent in SECCHK.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("dialect", &self.dialect)
            .field("security", &self.security)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_from_str() {
        assert_eq!("derby".parse::<Dialect>().unwrap(), Dialect::Derby);
        assert_eq!("DB2".parse::<Dialect>().unwrap(), Dialect::Db2);
        assert!("oracle".parse::<Dialect>().is_err());
    }

    #[test]
    fn test_dialect_resolution() {
        assert_eq!(Dialect::resolve(None, None), Dialect::Derby);
        assert_eq!(Dialect::resolve(None, Some("db2inst1")), Dialect::Db2);
        assert_eq!(Dialect::resolve(Some(Dialect::Derby), Some("x")), Dialect::Derby);
    }

    #[test]
    fn test_derby_session_ignores_credentials() {
        let s = SessionConfig::new(Dialect::Derby, "testdb", Some("bob"), Some("pw")).unwrap();
        assert_eq!(s.user(), "APP");
        assert_eq!(s.password(), "");
        assert_eq!(s.security(), SecurityMechanism::UserIdOnly);
        assert_eq!(s.byte_order(), ByteOrder::BigEndian);
        assert_eq!(s.rdb_name(), b"testdb            ");
    }

    #[test]
    fn test_db2_session() {
        let s = SessionConfig::new(Dialect::Db2, "SAMPLE", Some("db2inst1"), Some("pw")).unwrap();
        assert_eq!(s.user(), "db2inst1");
        assert_eq!(s.security().code(), 3);
        assert_eq!(s.encoding(), Encoding::Cp500);
        assert_eq!(s.rdb_name().len(), RDB_NAME_LENGTH);
        assert_eq!(&s.rdb_name()[..2], &[0xE2, 0xC1]);
        assert_eq!(s.rdb_name()[17], 0x40);
    }

    #[test]
    fn test_long_database_name_truncated() {
        let s = SessionConfig::new(Dialect::Derby, "a_very_long_database_name", None, None).unwrap();
        assert_eq!(s.rdb_name(), b"a_very_long_databa");
    }

    #[test]
    fn test_debug_redacts_password() {
        let s = SessionConfig::new(Dialect::Db2, "db", Some("u"), Some("secret")).unwrap();
        assert!(!format!("{s:?}").contains("secret"));
    }
}
