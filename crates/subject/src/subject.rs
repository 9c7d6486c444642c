//! The Subject tagged union (spec §3.1 / C1).
//!
//! A closed enumeration with variant-specific data and a single decode
//! dispatcher keyed on the `format` tag, per the design note in spec §9:
//! a straight class hierarchy with runtime type probing would work here
//! too, but it is the brittle way to model a tagged sum.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SubjectError;

/// A security-event subject: one of the simple identifier kinds, or a
/// `complex` subject composed of named component slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format")]
pub enum Subject {
    #[serde(rename = "email")]
    Email { email: String },
    #[serde(rename = "phone_number")]
    Phone { phone: String },
    #[serde(rename = "iss_sub")]
    IssSub { issuer: String, sub: String },
    #[serde(rename = "opaque")]
    Opaque { id: String },
    #[serde(rename = "uri")]
    Uri { uri: String },
    #[serde(rename = "account")]
    Account { uri: String },
    #[serde(rename = "did")]
    Did { url: String },
    #[serde(rename = "jwt_id")]
    JwtId { iss: String, jti: String },
    #[serde(rename = "saml_assertion_id")]
    SamlAssertionId { issuer: String, assertion_id: String },
    #[serde(rename = "complex")]
    Complex(ComplexSubject),
}

/// The `complex` variant: a set of optionally-populated named component slots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplexSubject {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub user: Option<Box<Subject>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub device: Option<Box<Subject>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub session: Option<Box<Subject>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub application: Option<Box<Subject>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tenant: Option<Box<Subject>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub org_unit: Option<Box<Subject>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub group: Option<Box<Subject>>,
}

const COMPLEX_SLOTS: &[&str] = &[
    "user",
    "device",
    "session",
    "application",
    "tenant",
    "org_unit",
    "group",
];

fn trimmed(s: &str) -> String {
    s.trim().to_string()
}

fn email_re() -> &'static regex::Regex {
    // A pragmatic RFC 5322 approximation, not a full grammar.
    static RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| {
        regex::Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static email regex is valid")
    })
}

impl Subject {
    pub fn new_email(email: impl Into<String>) -> Result<Self, SubjectError> {
        let s = Self::Email {
            email: trimmed(&email.into()),
        };
        s.validate()?;
        Ok(s)
    }

    pub fn new_phone(phone: impl Into<String>) -> Result<Self, SubjectError> {
        let s = Self::Phone {
            phone: trimmed(&phone.into()),
        };
        s.validate()?;
        Ok(s)
    }

    pub fn new_iss_sub(issuer: impl Into<String>, sub: impl Into<String>) -> Result<Self, SubjectError> {
        let s = Self::IssSub {
            issuer: trimmed(&issuer.into()),
            sub: trimmed(&sub.into()),
        };
        s.validate()?;
        Ok(s)
    }

    pub fn new_opaque(id: impl Into<String>) -> Result<Self, SubjectError> {
        let s = Self::Opaque {
            id: trimmed(&id.into()),
        };
        s.validate()?;
        Ok(s)
    }

    pub fn new_uri(uri: impl Into<String>) -> Result<Self, SubjectError> {
        let s = Self::Uri {
            uri: trimmed(&uri.into()),
        };
        s.validate()?;
        Ok(s)
    }

    pub fn new_account(uri: impl Into<String>) -> Result<Self, SubjectError> {
        let s = Self::Account {
            uri: trimmed(&uri.into()),
        };
        s.validate()?;
        Ok(s)
    }

    pub fn new_did(url: impl Into<String>) -> Result<Self, SubjectError> {
        let s = Self::Did {
            url: trimmed(&url.into()),
        };
        s.validate()?;
        Ok(s)
    }

    pub fn new_jwt_id(iss: impl Into<String>, jti: impl Into<String>) -> Result<Self, SubjectError> {
        let s = Self::JwtId {
            iss: trimmed(&iss.into()),
            jti: trimmed(&jti.into()),
        };
        s.validate()?;
        Ok(s)
    }

    pub fn new_saml_assertion_id(
        issuer: impl Into<String>,
        assertion_id: impl Into<String>,
    ) -> Result<Self, SubjectError> {
        let s = Self::SamlAssertionId {
            issuer: trimmed(&issuer.into()),
            assertion_id: trimmed(&assertion_id.into()),
        };
        s.validate()?;
        Ok(s)
    }

    pub fn new_complex() -> Self {
        Self::Complex(ComplexSubject::default())
    }

    /// Fluent setter for the complex variant's named slots. A no-op (returns
    /// self unchanged) when called on a non-complex subject.
    pub fn with_user(self, sub: Subject) -> Self {
        self.with_slot_impl(|c| c.user = Some(Box::new(sub)))
    }
    pub fn with_device(self, sub: Subject) -> Self {
        self.with_slot_impl(|c| c.device = Some(Box::new(sub)))
    }
    pub fn with_session(self, sub: Subject) -> Self {
        self.with_slot_impl(|c| c.session = Some(Box::new(sub)))
    }
    pub fn with_application(self, sub: Subject) -> Self {
        self.with_slot_impl(|c| c.application = Some(Box::new(sub)))
    }
    pub fn with_tenant(self, sub: Subject) -> Self {
        self.with_slot_impl(|c| c.tenant = Some(Box::new(sub)))
    }
    pub fn with_org_unit(self, sub: Subject) -> Self {
        self.with_slot_impl(|c| c.org_unit = Some(Box::new(sub)))
    }
    pub fn with_group(self, sub: Subject) -> Self {
        self.with_slot_impl(|c| c.group = Some(Box::new(sub)))
    }

    fn with_slot_impl(mut self, set: impl FnOnce(&mut ComplexSubject)) -> Self {
        match &mut self {
            Subject::Complex(c) => set(c),
            _ => {
                let mut c = ComplexSubject::default();
                set(&mut c);
                return Subject::Complex(c);
            }
        }
        self
    }

    pub fn user(&self) -> Option<&Subject> {
        match self {
            Subject::Complex(c) => c.user.as_deref(),
            _ => None,
        }
    }
    pub fn device(&self) -> Option<&Subject> {
        match self {
            Subject::Complex(c) => c.device.as_deref(),
            _ => None,
        }
    }
    pub fn session(&self) -> Option<&Subject> {
        match self {
            Subject::Complex(c) => c.session.as_deref(),
            _ => None,
        }
    }
    pub fn application(&self) -> Option<&Subject> {
        match self {
            Subject::Complex(c) => c.application.as_deref(),
            _ => None,
        }
    }
    pub fn tenant(&self) -> Option<&Subject> {
        match self {
            Subject::Complex(c) => c.tenant.as_deref(),
            _ => None,
        }
    }
    pub fn org_unit(&self) -> Option<&Subject> {
        match self {
            Subject::Complex(c) => c.org_unit.as_deref(),
            _ => None,
        }
    }
    pub fn group(&self) -> Option<&Subject> {
        match self {
            Subject::Complex(c) => c.group.as_deref(),
            _ => None,
        }
    }

    /// The `format` tag for this subject.
    pub fn format(&self) -> &'static str {
        match self {
            Subject::Email { .. } => "email",
            Subject::Phone { .. } => "phone_number",
            Subject::IssSub { .. } => "iss_sub",
            Subject::Opaque { .. } => "opaque",
            Subject::Uri { .. } => "uri",
            Subject::Account { .. } => "account",
            Subject::Did { .. } => "did",
            Subject::JwtId { .. } => "jwt_id",
            Subject::SamlAssertionId { .. } => "saml_assertion_id",
            Subject::Complex(_) => "complex",
        }
    }

    /// Validates format-specific invariants (spec §3.1 invariants a–e).
    pub fn validate(&self) -> Result<(), SubjectError> {
        match self {
            Subject::Email { email } => {
                if email.is_empty() {
                    return Err(SubjectError::MissingField { format: "email", field: "email" });
                }
                if !email_re().is_match(email) {
                    return Err(SubjectError::InvalidField {
                        field: "email",
                        reason: "not a valid RFC 5322 address".into(),
                    });
                }
                Ok(())
            }
            Subject::Phone { phone } => {
                if phone.is_empty() {
                    return Err(SubjectError::MissingField { format: "phone_number", field: "phone" });
                }
                Ok(())
            }
            Subject::IssSub { issuer, sub } => {
                if issuer.is_empty() {
                    return Err(SubjectError::MissingField { format: "iss_sub", field: "issuer" });
                }
                if sub.is_empty() {
                    return Err(SubjectError::MissingField { format: "iss_sub", field: "sub" });
                }
                Ok(())
            }
            Subject::Opaque { id } => {
                if id.is_empty() {
                    return Err(SubjectError::MissingField { format: "opaque", field: "id" });
                }
                Ok(())
            }
            Subject::Uri { uri } => {
                url::Url::parse(uri).map_err(|e| SubjectError::InvalidField {
                    field: "uri",
                    reason: e.to_string(),
                })?;
                Ok(())
            }
            Subject::Account { uri } => {
                if !uri.starts_with("acct:") {
                    return Err(SubjectError::InvalidField {
                        field: "uri",
                        reason: "account subject uri must begin with `acct:`".into(),
                    });
                }
                Ok(())
            }
            Subject::Did { url } => {
                if !url.starts_with("did:") {
                    return Err(SubjectError::InvalidField {
                        field: "url",
                        reason: "did subject url must begin with `did:`".into(),
                    });
                }
                Ok(())
            }
            Subject::JwtId { iss, jti } => {
                if iss.is_empty() {
                    return Err(SubjectError::MissingField { format: "jwt_id", field: "iss" });
                }
                if jti.is_empty() {
                    return Err(SubjectError::MissingField { format: "jwt_id", field: "jti" });
                }
                Ok(())
            }
            Subject::SamlAssertionId { issuer, assertion_id } => {
                if issuer.is_empty() {
                    return Err(SubjectError::MissingField {
                        format: "saml_assertion_id",
                        field: "issuer",
                    });
                }
                if assertion_id.is_empty() {
                    return Err(SubjectError::MissingField {
                        format: "saml_assertion_id",
                        field: "assertion_id",
                    });
                }
                Ok(())
            }
            Subject::Complex(c) => {
                let any_present = c.user.is_some()
                    || c.device.is_some()
                    || c.session.is_some()
                    || c.application.is_some()
                    || c.tenant.is_some()
                    || c.org_unit.is_some()
                    || c.group.is_some();
                if !any_present {
                    return Err(SubjectError::EmptyComplexSubject);
                }
                for slot in [
                    &c.user, &c.device, &c.session, &c.application, &c.tenant, &c.org_unit, &c.group,
                ] {
                    if let Some(inner) = slot {
                        inner.validate()?;
                    }
                }
                Ok(())
            }
        }
    }

    /// Encodes this subject as its wire mapping (spec §6.2).
    pub fn encode(&self) -> Value {
        serde_json::to_value(self).expect("Subject serialization is infallible")
    }

    /// Decodes a subject from its wire mapping, dispatching on `format`
    /// and validating the result (spec §4.1 decode algorithm).
    pub fn decode(value: &Value) -> Result<Subject, SubjectError> {
        let obj = value
            .as_object()
            .ok_or(SubjectError::NotAnObject(type_name(value)))?;

        let format = obj
            .get("format")
            .and_then(Value::as_str)
            .ok_or(SubjectError::MissingFormat)?;

        tracing::debug!(format, "decoding subject");

        let subject = match format {
            "email" => Subject::Email {
                email: trimmed(require_str(obj, "email", "email")?),
            },
            "phone_number" => Subject::Phone {
                phone: trimmed(require_str(obj, "phone_number", "phone")?),
            },
            "iss_sub" => Subject::IssSub {
                issuer: trimmed(require_str(obj, "iss_sub", "issuer")?),
                sub: trimmed(require_str(obj, "iss_sub", "sub")?),
            },
            "opaque" => Subject::Opaque {
                id: trimmed(require_str(obj, "opaque", "id")?),
            },
            "uri" => Subject::Uri {
                uri: trimmed(require_str(obj, "uri", "uri")?),
            },
            "account" => Subject::Account {
                uri: trimmed(require_str(obj, "account", "uri")?),
            },
            "did" => Subject::Did {
                url: trimmed(require_str(obj, "did", "url")?),
            },
            "jwt_id" => Subject::JwtId {
                iss: trimmed(require_str(obj, "jwt_id", "iss")?),
                jti: trimmed(require_str(obj, "jwt_id", "jti")?),
            },
            "saml_assertion_id" => Subject::SamlAssertionId {
                issuer: trimmed(require_str(obj, "saml_assertion_id", "issuer")?),
                assertion_id: trimmed(require_str(obj, "saml_assertion_id", "assertion_id")?),
            },
            "complex" => Subject::Complex(decode_complex(obj)?),
            other => {
                tracing::warn!(format = other, "unknown subject format");
                return Err(SubjectError::InvalidFormat(other.to_string()));
            }
        };

        if let Err(err) = subject.validate() {
            tracing::warn!(format, %err, "subject failed validation");
            return Err(err);
        }
        Ok(subject)
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn require_str<'a>(obj: &'a Map<String, Value>, format: &'static str, field: &'static str) -> Result<&'a str, SubjectError> {
    obj.get(field)
        .and_then(Value::as_str)
        .ok_or(SubjectError::MissingField { format, field })
}

fn decode_complex(obj: &Map<String, Value>) -> Result<ComplexSubject, SubjectError> {
    let mut complex = ComplexSubject::default();
    for slot in COMPLEX_SLOTS {
        let Some(raw) = obj.get(*slot) else { continue };
        if raw.is_null() {
            continue;
        }
        let decoded = Box::new(Subject::decode(raw)?);
        match *slot {
            "user" => complex.user = Some(decoded),
            "device" => complex.device = Some(decoded),
            "session" => complex.session = Some(decoded),
            "application" => complex.application = Some(decoded),
            "tenant" => complex.tenant = Some(decoded),
            "org_unit" => complex.org_unit = Some(decoded),
            "group" => complex.group = Some(decoded),
            _ => unreachable!("slot drawn from COMPLEX_SLOTS"),
        }
    }
    Ok(complex)
}
