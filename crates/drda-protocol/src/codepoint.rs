//! DDM code point table.
//!
//! Every DDM object begins with a 2-byte code point that identifies what it
//! is. Top-level objects (commands, command data, reply messages and reply
//! data) are modelled as the closed [`CodePoint`] enum with an explicit
//! [`CodePoint::Unknown`] fallback, so dispatch sites match exhaustively and
//! unrecognised objects are skipped rather than misread.
//!
//! Parameters nested inside collections are plain constants in [`param`].

/// A top-level DDM code point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodePoint {
    // Commands
    /// Exchange server attributes.
    ExcSat,
    /// Access security.
    AccSec,
    /// Security check.
    SecChk,
    /// Access relational database.
    AccRdb,
    /// Close query.
    ClsQry,
    /// Continue query.
    CntQry,
    /// Describe SQL statement.
    DscSqlStt,
    /// Execute immediate SQL statement.
    ExcSqlImm,
    /// Execute SQL statement.
    ExcSqlStt,
    /// Open query.
    OpnQry,
    /// Prepare SQL statement.
    PrpSqlStt,
    /// Commit unit of work.
    RdbCmm,
    /// Roll back unit of work.
    RdbRllbck,
    /// Set SQL environment.
    ExcSqlSet,

    // Command data objects
    /// SQL statement text.
    SqlStt,
    /// SQL statement attributes.
    SqlAttr,

    // Reply data objects
    /// Server attributes reply data.
    ExcSatRd,
    /// Access security reply data.
    AccSecRd,
    /// SQL communications area reply data.
    SqlCard,
    /// SQL descriptor area reply data.
    SqlDard,
    /// Query answer set description.
    QryDsc,
    /// Query answer set data.
    QryDta,

    // Reply messages
    /// Security check complete.
    SecChkRm,
    /// Access to RDB completed.
    AccRdbRm,
    /// Open query complete.
    OpnQryRm,
    /// End of query.
    EndQryRm,
    /// End unit of work condition.
    EndUowRm,
    /// SQL error condition.
    SqlErrRm,
    /// RDB update reply.
    RdbUpdRm,
    /// Permanent agent error.
    AgnPrmRm,
    /// Command check.
    CmdChkRm,
    /// Command not supported.
    CmdNspRm,
    /// Manager level conflict.
    MgrLvlRm,
    /// Conversational protocol error.
    PrcCnvRm,
    /// Parameter not supported.
    PrmNspRm,
    /// Data stream syntax error.
    SyntaxRm,
    /// Parameter value not supported.
    ValNspRm,
    /// RDB not accessed.
    RdbNacRm,
    /// RDB not found.
    RdbNfnRm,
    /// RDB access failed.
    RdbAflRm,
    /// Not authorized to RDB.
    RdbAthRm,
    /// Query not open.
    QryNopRm,
    /// Query previously opened.
    QryPopRm,
    /// Abnormal end of unit of work.
    AbnUowRm,
    /// Open query failure.
    OpnQflRm,

    /// A code point this client does not interpret.
    Unknown(u16),
}

impl CodePoint {
    /// Map a raw code point to its enum value.
    #[must_use]
    pub const fn from_u16(value: u16) -> Self {
        match value {
            0x1041 => Self::ExcSat,
            0x106D => Self::AccSec,
            0x106E => Self::SecChk,
            0x2001 => Self::AccRdb,
            0x2005 => Self::ClsQry,
            0x2006 => Self::CntQry,
            0x2008 => Self::DscSqlStt,
            0x200A => Self::ExcSqlImm,
            0x200B => Self::ExcSqlStt,
            0x200C => Self::OpnQry,
            0x200D => Self::PrpSqlStt,
            0x200E => Self::RdbCmm,
            0x200F => Self::RdbRllbck,
            0x2014 => Self::ExcSqlSet,
            0x2414 => Self::SqlStt,
            0x2450 => Self::SqlAttr,
            0x1443 => Self::ExcSatRd,
            0x14AC => Self::AccSecRd,
            0x2408 => Self::SqlCard,
            0x2411 => Self::SqlDard,
            0x241A => Self::QryDsc,
            0x241B => Self::QryDta,
            0x1219 => Self::SecChkRm,
            0x2201 => Self::AccRdbRm,
            0x2205 => Self::OpnQryRm,
            0x220B => Self::EndQryRm,
            0x220C => Self::EndUowRm,
            0x2213 => Self::SqlErrRm,
            0x2218 => Self::RdbUpdRm,
            0x1232 => Self::AgnPrmRm,
            0x1254 => Self::CmdChkRm,
            0x1250 => Self::CmdNspRm,
            0x1210 => Self::MgrLvlRm,
            0x1245 => Self::PrcCnvRm,
            0x1251 => Self::PrmNspRm,
            0x124C => Self::SyntaxRm,
            0x1252 => Self::ValNspRm,
            0x2204 => Self::RdbNacRm,
            0x2211 => Self::RdbNfnRm,
            0x221A => Self::RdbAflRm,
            0x22CB => Self::RdbAthRm,
            0x2202 => Self::QryNopRm,
            0x220F => Self::QryPopRm,
            0x220D => Self::AbnUowRm,
            0x2212 => Self::OpnQflRm,
            other => Self::Unknown(other),
        }
    }

    /// The raw 16-bit code point.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        match self {
            Self::ExcSat => 0x1041,
            Self::AccSec => 0x106D,
            Self::SecChk => 0x106E,
            Self::AccRdb => 0x2001,
            Self::ClsQry => 0x2005,
            Self::CntQry => 0x2006,
            Self::DscSqlStt => 0x2008,
            Self::ExcSqlImm => 0x200A,
            Self::ExcSqlStt => 0x200B,
            Self::OpnQry => 0x200C,
            Self::PrpSqlStt => 0x200D,
            Self::RdbCmm => 0x200E,
            Self::RdbRllbck => 0x200F,
            Self::ExcSqlSet => 0x2014,
            Self::SqlStt => 0x2414,
            Self::SqlAttr => 0x2450,
            Self::ExcSatRd => 0x1443,
            Self::AccSecRd => 0x14AC,
            Self::SqlCard => 0x2408,
            Self::SqlDard => 0x2411,
            Self::QryDsc => 0x241A,
            Self::QryDta => 0x241B,
            Self::SecChkRm => 0x1219,
            Self::AccRdbRm => 0x2201,
            Self::OpnQryRm => 0x2205,
            Self::EndQryRm => 0x220B,
            Self::EndUowRm => 0x220C,
            Self::SqlErrRm => 0x2213,
            Self::RdbUpdRm => 0x2218,
            Self::AgnPrmRm => 0x1232,
            Self::CmdChkRm => 0x1254,
            Self::CmdNspRm => 0x1250,
            Self::MgrLvlRm => 0x1210,
            Self::PrcCnvRm => 0x1245,
            Self::PrmNspRm => 0x1251,
            Self::SyntaxRm => 0x124C,
            Self::ValNspRm => 0x1252,
            Self::RdbNacRm => 0x2204,
            Self::RdbNfnRm => 0x2211,
            Self::RdbAflRm => 0x221A,
            Self::RdbAthRm => 0x22CB,
            Self::QryNopRm => 0x2202,
            Self::QryPopRm => 0x220F,
            Self::AbnUowRm => 0x220D,
            Self::OpnQflRm => 0x2212,
            Self::Unknown(value) => value,
        }
    }

    /// Whether this code point is sent as a DSS *object* rather than a
    /// request. Objects ride under the correlation id of the preceding
    /// command.
    #[must_use]
    pub const fn is_command_object(self) -> bool {
        matches!(self, Self::SqlStt | Self::SqlAttr)
    }

    /// Whether this is a reply message that reports a failed request.
    ///
    /// Reply messages listed here are treated as errors when their severity
    /// code is at least [`param::SVRCOD_ERROR`].
    #[must_use]
    pub const fn is_error_reply(self) -> bool {
        matches!(
            self,
            Self::AgnPrmRm
                | Self::CmdChkRm
                | Self::CmdNspRm
                | Self::MgrLvlRm
                | Self::PrcCnvRm
                | Self::PrmNspRm
                | Self::SyntaxRm
                | Self::ValNspRm
                | Self::RdbNacRm
                | Self::RdbNfnRm
                | Self::RdbAflRm
                | Self::RdbAthRm
                | Self::AbnUowRm
                | Self::OpnQflRm
        )
    }

    /// The DDM mnemonic for this code point.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ExcSat => "EXCSAT",
            Self::AccSec => "ACCSEC",
            Self::SecChk => "SECCHK",
            Self::AccRdb => "ACCRDB",
            Self::ClsQry => "CLSQRY",
            Self::CntQry => "CNTQRY",
            Self::DscSqlStt => "DSCSQLSTT",
            Self::ExcSqlImm => "EXCSQLIMM",
            Self::ExcSqlStt => "EXCSQLSTT",
            Self::OpnQry => "OPNQRY",
            Self::PrpSqlStt => "PRPSQLSTT",
            Self::RdbCmm => "RDBCMM",
            Self::RdbRllbck => "RDBRLLBCK",
            Self::ExcSqlSet => "EXCSQLSET",
            Self::SqlStt => "SQLSTT",
            Self::SqlAttr => "SQLATTR",
            Self::ExcSatRd => "EXCSATRD",
            Self::AccSecRd => "ACCSECRD",
            Self::SqlCard => "SQLCARD",
            Self::SqlDard => "SQLDARD",
            Self::QryDsc => "QRYDSC",
            Self::QryDta => "QRYDTA",
            Self::SecChkRm => "SECCHKRM",
            Self::AccRdbRm => "ACCRDBRM",
            Self::OpnQryRm => "OPNQRYRM",
            Self::EndQryRm => "ENDQRYRM",
            Self::EndUowRm => "ENDUOWRM",
            Self::SqlErrRm => "SQLERRRM",
            Self::RdbUpdRm => "RDBUPDRM",
            Self::AgnPrmRm => "AGNPRMRM",
            Self::CmdChkRm => "CMDCHKRM",
            Self::CmdNspRm => "CMDNSPRM",
            Self::MgrLvlRm => "MGRLVLRM",
            Self::PrcCnvRm => "PRCCNVRM",
            Self::PrmNspRm => "PRMNSPRM",
            Self::SyntaxRm => "SYNTAXRM",
            Self::ValNspRm => "VALNSPRM",
            Self::RdbNacRm => "RDBNACRM",
            Self::RdbNfnRm => "RDBNFNRM",
            Self::RdbAflRm => "RDBAFLRM",
            Self::RdbAthRm => "RDBATHRM",
            Self::QryNopRm => "QRYNOPRM",
            Self::QryPopRm => "QRYPOPRM",
            Self::AbnUowRm => "ABNUOWRM",
            Self::OpnQflRm => "OPNQFLRM",
            Self::Unknown(_) => "UNKNOWN",
        }
    }
}

impl From<u16> for CodePoint {
    fn from(value: u16) -> Self {
        Self::from_u16(value)
    }
}

impl From<CodePoint> for u16 {
    fn from(value: CodePoint) -> Self {
        value.as_u16()
    }
}

impl std::fmt::Display for CodePoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown(value) => write!(f, "0x{value:04X}"),
            known => f.write_str(known.name()),
        }
    }
}

/// Parameter code points used inside command and reply collections.
pub mod param {
    /// External name of the client.
    pub const EXTNAM: u16 = 0x115E;
    /// Server name.
    pub const SRVNAM: u16 = 0x116D;
    /// Server product release level.
    pub const SRVRLSLV: u16 = 0x115A;
    /// Server class name.
    pub const SRVCLSNM: u16 = 0x1147;
    /// Manager-level list.
    pub const MGRLVLLS: u16 = 0x1404;
    /// Severity code.
    pub const SVRCOD: u16 = 0x1149;
    /// Server diagnostic information.
    pub const SRVDGN: u16 = 0x1153;
    /// Security mechanism.
    pub const SECMEC: u16 = 0x11A2;
    /// Security check code.
    pub const SECCHKCD: u16 = 0x11A4;
    /// User id.
    pub const USRID: u16 = 0x11A0;
    /// Password.
    pub const PASSWORD: u16 = 0x11A1;
    /// Relational database name.
    pub const RDBNAM: u16 = 0x2110;
    /// RDB access manager class.
    pub const RDBACCCL: u16 = 0x210F;
    /// Product-specific identifier.
    pub const PRDID: u16 = 0x112E;
    /// Data type definition name.
    pub const TYPDEFNAM: u16 = 0x002F;
    /// Data type definition override.
    pub const TYPDEFOVR: u16 = 0x0035;
    /// CCSID for single-byte characters.
    pub const CCSIDSBC: u16 = 0x119C;
    /// CCSID for double-byte characters.
    pub const CCSIDDBC: u16 = 0x119D;
    /// CCSID for mixed-byte characters.
    pub const CCSIDMBC: u16 = 0x119E;
    /// Correlation token.
    pub const CRRTKN: u16 = 0x2135;
    /// Package name, consistency token and section number.
    pub const PKGNAMCSN: u16 = 0x2113;
    /// RDB commit allowed.
    pub const RDBCMTOK: u16 = 0x2105;
    /// Return SQL descriptor area.
    pub const RTNSQLDA: u16 = 0x2116;
    /// Type of SQL descriptor area.
    pub const TYPSQLDA: u16 = 0x2146;
    /// Query block size.
    pub const QRYBLKSZ: u16 = 0x2114;
    /// Maximum number of extra blocks.
    pub const MAXBLKEXT: u16 = 0x2141;
    /// Query close implicit.
    pub const QRYCLSIMP: u16 = 0x215D;
    /// Dynamic data format.
    pub const DYNDTAFMT: u16 = 0x214B;
    /// Query instance identifier.
    pub const QRYINSID: u16 = 0x215B;
    /// Query protocol type.
    pub const QRYPRCTYP: u16 = 0x2102;
    /// Agent manager.
    pub const AGENT: u16 = 0x1403;
    /// SQL application manager.
    pub const SQLAM: u16 = 0x2407;
    /// TCP/IP communication manager.
    pub const CMNTCPIP: u16 = 0x1474;
    /// Relational database manager.
    pub const RDB: u16 = 0x240F;
    /// Security manager.
    pub const SECMGR: u16 = 0x1440;
    /// Unicode manager.
    pub const UNICODEMGR: u16 = 0x1C08;
    /// CCSID manager.
    pub const CCSIDMGR: u16 = 0x14CC;

    /// Security mechanism: user id and password.
    pub const SECMEC_USRIDPWD: u16 = 0x0003;
    /// Security mechanism: user id only.
    pub const SECMEC_USRIDONL: u16 = 0x0004;

    /// Severity code at and above which a reply reports an error.
    pub const SVRCOD_ERROR: u16 = 8;

    /// DDM boolean true (EBCDIC `1`).
    pub const TRUE: u8 = 0xF1;
    /// DDM boolean false (EBCDIC `0`).
    pub const FALSE: u8 = 0xF0;
}
