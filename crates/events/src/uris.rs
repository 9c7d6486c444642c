//! Event-type URI constants (spec §3.2), in the published
//! `https://schemas.openid.net/secevent/...` namespace the CAEP/RISC/SSF
//! specifications define.

pub mod caep {
    pub const SESSION_REVOKED: &str =
        "https://schemas.openid.net/secevent/caep/event-type/session-revoked";
    pub const CREDENTIAL_CHANGE: &str =
        "https://schemas.openid.net/secevent/caep/event-type/credential-change";
    pub const ASSURANCE_LEVEL_CHANGE: &str =
        "https://schemas.openid.net/secevent/caep/event-type/assurance-level-change";
    pub const DEVICE_COMPLIANCE_CHANGE: &str =
        "https://schemas.openid.net/secevent/caep/event-type/device-compliance-change";
    pub const TOKEN_CLAIMS_CHANGE: &str =
        "https://schemas.openid.net/secevent/caep/event-type/token-claims-change";
}

pub mod risc {
    pub const ACCOUNT_PURGED: &str =
        "https://schemas.openid.net/secevent/risc/event-type/account-purged";
    pub const ACCOUNT_DISABLED: &str =
        "https://schemas.openid.net/secevent/risc/event-type/account-disabled";
    pub const ACCOUNT_ENABLED: &str =
        "https://schemas.openid.net/secevent/risc/event-type/account-enabled";
    pub const ACCOUNT_CREDENTIAL_CHANGE_REQUIRED: &str =
        "https://schemas.openid.net/secevent/risc/event-type/credential-change-required";
    pub const IDENTIFIER_CHANGED: &str =
        "https://schemas.openid.net/secevent/risc/event-type/identifier-changed";
    pub const IDENTIFIER_RECYCLED: &str =
        "https://schemas.openid.net/secevent/risc/event-type/identifier-recycled";
    pub const CREDENTIAL_COMPROMISE: &str =
        "https://schemas.openid.net/secevent/risc/event-type/credential-compromise";
    pub const OPT_IN: &str = "https://schemas.openid.net/secevent/risc/event-type/opt-in";
    pub const OPT_OUT: &str = "https://schemas.openid.net/secevent/risc/event-type/opt-out";
    pub const RECOVERY_ACTIVATED: &str =
        "https://schemas.openid.net/secevent/risc/event-type/recovery-activated";
    pub const RECOVERY_INFORMATION_CHANGED: &str =
        "https://schemas.openid.net/secevent/risc/event-type/recovery-information-changed";
}

pub mod ssf {
    pub const VERIFICATION: &str = "https://schemas.openid.net/secevent/ssf/event-type/verification";
    pub const STREAM_UPDATE: &str =
        "https://schemas.openid.net/secevent/ssf/event-type/stream-update";
}

/// Every event-type URI this crate self-registers at first registry access.
pub fn known_types() -> Vec<&'static str> {
    vec![
        caep::SESSION_REVOKED,
        caep::CREDENTIAL_CHANGE,
        caep::ASSURANCE_LEVEL_CHANGE,
        caep::DEVICE_COMPLIANCE_CHANGE,
        caep::TOKEN_CLAIMS_CHANGE,
        risc::ACCOUNT_PURGED,
        risc::ACCOUNT_DISABLED,
        risc::ACCOUNT_ENABLED,
        risc::ACCOUNT_CREDENTIAL_CHANGE_REQUIRED,
        risc::IDENTIFIER_CHANGED,
        risc::IDENTIFIER_RECYCLED,
        risc::CREDENTIAL_COMPROMISE,
        risc::OPT_IN,
        risc::OPT_OUT,
        risc::RECOVERY_ACTIVATED,
        risc::RECOVERY_INFORMATION_CHANGED,
        ssf::VERIFICATION,
        ssf::STREAM_UPDATE,
    ]
}
