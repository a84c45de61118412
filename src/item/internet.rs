//! Internet password items, keyed by server and its connection attributes.

use serde::{Deserialize, Serialize};

use crate::attributes::{AttrKey, AttrValue, Attributes, ItemClass};
use crate::error::{KeychainError, KeychainResult};

use super::{ItemCommon, PasswordItem, SecretData};

/// Network protocol of an internet password
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    Http,
    Https,
    Ftp,
    Ftps,
    Ssh,
    Telnet,
    Smtp,
    Imap,
    Imaps,
    Pop3,
    Pop3s,
    Ldap,
    Ldaps,
    Smb,
    Socks,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "htps",
            Self::Ftp => "ftp ",
            Self::Ftps => "ftps",
            Self::Ssh => "ssh ",
            Self::Telnet => "teln",
            Self::Smtp => "smtp",
            Self::Imap => "imap",
            Self::Imaps => "imps",
            Self::Pop3 => "pop3",
            Self::Pop3s => "pops",
            Self::Ldap => "ldap",
            Self::Ldaps => "ldps",
            Self::Smb => "smb ",
            Self::Socks => "sox ",
        }
    }

    pub fn from_code(s: &str) -> Option<Self> {
        match s {
            "http" => Some(Self::Http),
            "htps" => Some(Self::Https),
            "ftp " => Some(Self::Ftp),
            "ftps" => Some(Self::Ftps),
            "ssh " => Some(Self::Ssh),
            "teln" => Some(Self::Telnet),
            "smtp" => Some(Self::Smtp),
            "imap" => Some(Self::Imap),
            "imps" => Some(Self::Imaps),
            "pop3" => Some(Self::Pop3),
            "pops" => Some(Self::Pop3s),
            "ldap" => Some(Self::Ldap),
            "ldps" => Some(Self::Ldaps),
            "smb " => Some(Self::Smb),
            "sox " => Some(Self::Socks),
            _ => None,
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            Self::Http => 80,
            Self::Https => 443,
            Self::Ftp => 21,
            Self::Ftps => 990,
            Self::Ssh => 22,
            Self::Telnet => 23,
            Self::Smtp => 25,
            Self::Imap => 143,
            Self::Imaps => 993,
            Self::Pop3 => 110,
            Self::Pop3s => 995,
            Self::Ldap => 389,
            Self::Ldaps => 636,
            Self::Smb => 445,
            Self::Socks => 1080,
        }
    }
}

/// Authentication scheme of an internet password
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthScheme {
    Default,
    HttpBasic,
    HttpDigest,
    HtmlForm,
    Ntlm,
    Negotiate,
}

impl AuthScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "dflt",
            Self::HttpBasic => "http",
            Self::HttpDigest => "httd",
            Self::HtmlForm => "form",
            Self::Ntlm => "ntlm",
            Self::Negotiate => "ngtt",
        }
    }

    pub fn from_code(s: &str) -> Option<Self> {
        match s {
            "dflt" => Some(Self::Default),
            "http" => Some(Self::HttpBasic),
            "httd" => Some(Self::HttpDigest),
            "form" => Some(Self::HtmlForm),
            "ntlm" => Some(Self::Ntlm),
            "ngtt" => Some(Self::Negotiate),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternetPassword {
    /// Server host; required for add
    #[serde(default)]
    pub server: String,
    pub port: Option<u16>,
    pub protocol: Option<Protocol>,
    pub auth_scheme: Option<AuthScheme>,
    #[serde(default)]
    pub security_domain: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub common: ItemCommon,
}

impl InternetPassword {
    pub fn new(
        server: impl Into<String>,
        account: impl Into<String>,
        secret: impl Into<SecretData>,
    ) -> Self {
        let mut common = ItemCommon::with_account(account);
        common.secret = Some(secret.into());
        Self {
            server: server.into(),
            common,
            ..Default::default()
        }
    }

    /// Secret-less item narrowed to `server`; an empty server leaves it unspecified
    pub fn matching(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            ..Default::default()
        }
    }

    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.common.account = account.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = Some(protocol);
        self
    }

    pub fn with_auth_scheme(mut self, scheme: AuthScheme) -> Self {
        self.auth_scheme = Some(scheme);
        self
    }

    pub fn with_security_domain(mut self, domain: impl Into<String>) -> Self {
        self.security_domain = domain.into();
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.common.label = Some(label.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.common.comment = Some(comment.into());
        self
    }

    pub fn synchronizable(mut self, synchronizable: bool) -> Self {
        self.common.synchronizable = synchronizable;
        self
    }

    /// Explicit port, else the protocol's well-known port
    pub fn effective_port(&self) -> Option<u16> {
        self.port.or_else(|| self.protocol.map(|p| p.default_port()))
    }
}

impl PasswordItem for InternetPassword {
    const CLASS: ItemClass = ItemClass::Internet;

    fn common(&self) -> &ItemCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut ItemCommon {
        &mut self.common
    }

    fn write_identity(&self, attrs: &mut Attributes) {
        attrs.insert_text(AttrKey::Server, &self.server);
        if let Some(port) = self.port {
            attrs.insert(AttrKey::Port, AttrValue::Number(u32::from(port)));
        }
        if let Some(protocol) = self.protocol {
            attrs.insert(AttrKey::Protocol, protocol.as_str());
        }
        if let Some(scheme) = self.auth_scheme {
            attrs.insert(AttrKey::AuthType, scheme.as_str());
        }
        attrs.insert_text(AttrKey::SecurityDomain, &self.security_domain);
        attrs.insert_text(AttrKey::Path, &self.path);
    }

    fn has_natural_key(&self) -> bool {
        !self.server.is_empty()
    }

    fn from_identity(attrs: &Attributes, common: ItemCommon) -> KeychainResult<Self> {
        let server = attrs
            .text(AttrKey::Server)?
            .filter(|s| !s.is_empty())
            .ok_or_else(|| KeychainError::invalid("internet password record has no server"))?;

        let port = attrs
            .number(AttrKey::Port)?
            .map(|n| {
                u16::try_from(n)
                    .map_err(|_| KeychainError::invalid(format!("port {} out of range", n)))
            })
            .transpose()?;

        let protocol = attrs
            .text(AttrKey::Protocol)?
            .map(|code| {
                Protocol::from_code(code)
                    .ok_or_else(|| KeychainError::invalid(format!("unknown protocol '{}'", code)))
            })
            .transpose()?;

        let auth_scheme = attrs
            .text(AttrKey::AuthType)?
            .map(|code| {
                AuthScheme::from_code(code).ok_or_else(|| {
                    KeychainError::invalid(format!("unknown authentication scheme '{}'", code))
                })
            })
            .transpose()?;

        Ok(Self {
            server: server.to_string(),
            port,
            protocol,
            auth_scheme,
            security_domain: attrs.text(AttrKey::SecurityDomain)?.unwrap_or_default().to_string(),
            path: attrs.text(AttrKey::Path)?.unwrap_or_default().to_string(),
            common,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreRecord;

    #[test]
    fn test_protocol_codes_roundtrip() {
        let all = [
            Protocol::Http,
            Protocol::Https,
            Protocol::Ftp,
            Protocol::Ftps,
            Protocol::Ssh,
            Protocol::Telnet,
            Protocol::Smtp,
            Protocol::Imap,
            Protocol::Imaps,
            Protocol::Pop3,
            Protocol::Pop3s,
            Protocol::Ldap,
            Protocol::Ldaps,
            Protocol::Smb,
            Protocol::Socks,
        ];
        for p in all {
            assert_eq!(Protocol::from_code(p.as_str()), Some(p));
        }
    }

    #[test]
    fn test_minimal_query_attributes() {
        let attrs = InternetPassword::matching("example.com").query_attributes();
        assert_eq!(attrs.class().unwrap(), ItemClass::Internet);
        assert_eq!(attrs.text(AttrKey::Server).unwrap(), Some("example.com"));
        assert_eq!(attrs.len(), 2);
    }

    #[test]
    fn test_full_query_attributes() {
        let item = InternetPassword::new("example.com", "bob", "pw")
            .with_port(8080)
            .with_protocol(Protocol::Http)
            .with_auth_scheme(AuthScheme::HttpBasic);
        let attrs = item.query_attributes();

        assert_eq!(attrs.number(AttrKey::Port).unwrap(), Some(8080));
        assert_eq!(attrs.text(AttrKey::Protocol).unwrap(), Some("http"));
        assert_eq!(attrs.text(AttrKey::AuthType).unwrap(), Some("http"));
        assert!(!attrs.contains(AttrKey::Path));
    }

    #[test]
    fn test_server_required() {
        assert!(!InternetPassword::new("", "bob", "pw").has_natural_key());
        assert!(InternetPassword::new("example.com", "", "pw").has_natural_key());

        let attrs = Attributes::for_class(ItemClass::Internet);
        assert!(InternetPassword::from_record(&StoreRecord::new(attrs, None)).is_err());
    }

    #[test]
    fn test_malformed_protocol_rejected() {
        let mut attrs = InternetPassword::matching("example.com").query_attributes();
        attrs.insert(AttrKey::Protocol, "gopher");
        let err = InternetPassword::from_record(&StoreRecord::new(attrs, None)).unwrap_err();
        assert!(matches!(err, KeychainError::InvalidItemData(_)));
    }

    #[test]
    fn test_port_out_of_range_rejected() {
        let mut attrs = InternetPassword::matching("example.com").query_attributes();
        attrs.insert(AttrKey::Port, AttrValue::Number(70_000));
        assert!(InternetPassword::from_record(&StoreRecord::new(attrs, None)).is_err());
    }

    #[test]
    fn test_effective_port() {
        let item = InternetPassword::matching("example.com").with_protocol(Protocol::Https);
        assert_eq!(item.effective_port(), Some(443));
        assert_eq!(item.with_port(8443).effective_port(), Some(8443));
    }
}
