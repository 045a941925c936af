use std::net::IpAddr;
use std::sync::LazyLock;

use brandops_core::AuditLogEntry;
use regex::{Captures, Regex};
use serde_json::Value;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([a-z0-9._%+-]+)@([a-z0-9-]+(?:\.[a-z0-9-]+)*\.[a-z]{2,})\b")
        .expect("valid email regex")
});

static IPV4_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,3})\.(\d{1,3})\.\d{1,3}\.\d{1,3}\b").expect("valid ipv4 regex")
});

/// Masks email addresses (`first2***@domain`) and IPv4 addresses
/// (`a.b.xxx.xxx`) inside free text.
#[must_use]
pub fn anonymize_text(text: &str) -> String {
    let masked = EMAIL_RE.replace_all(text, |caps: &Captures<'_>| {
        let local: String = caps[1].chars().take(2).collect();
        format!("{local}***@{}", &caps[2])
    });
    IPV4_RE.replace_all(&masked, "$1.$2.xxx.xxx").into_owned()
}

/// Masks a value known to be an email address, whatever its shape.
/// Values without an `@` are masked entirely.
#[must_use]
pub fn mask_email(email: &str) -> String {
    match email.rsplit_once('@') {
        Some((local, domain)) => {
            let kept: String = local.chars().take(2).collect();
            format!("{kept}***@{domain}")
        }
        None => "***".to_string(),
    }
}

/// Masks a value known to be an IP address. IPv4 keeps the first two
/// octets, IPv6 the first two hextets. Anything else is masked entirely.
#[must_use]
pub fn mask_ip(ip: &str) -> String {
    match ip.trim().parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => {
            let [a, b, _, _] = v4.octets();
            format!("{a}.{b}.xxx.xxx")
        }
        Ok(IpAddr::V6(v6)) => {
            let segments = v6.segments();
            format!("{:x}:{:x}:xxxx:xxxx:xxxx:xxxx:xxxx:xxxx", segments[0], segments[1])
        }
        Err(_) => "xxx".to_string(),
    }
}

/// Applies [`anonymize_text`] to every free-text field that may carry PII,
/// and [`mask_email`] / [`mask_ip`] to the dedicated user fields.
pub fn anonymize_entry(entry: &mut AuditLogEntry) {
    entry.message = anonymize_text(&entry.message);
    if let Some(description) = entry.description.as_mut() {
        *description = anonymize_text(description);
    }
    if let Some(user) = entry.user_context.as_mut() {
        if let Some(email) = user.email.as_mut() {
            *email = mask_email(email);
        }
        if let Some(ip) = user.ip_address.as_mut() {
            *ip = mask_ip(ip);
        }
    }
    if let Some(metadata) = entry.metadata.as_mut() {
        for value in metadata.values_mut() {
            anonymize_value(value);
        }
    }
}

fn anonymize_value(value: &mut Value) {
    match value {
        Value::String(s) => *s = anonymize_text(s),
        Value::Array(items) => items.iter_mut().for_each(anonymize_value),
        Value::Object(map) => map.values_mut().for_each(anonymize_value),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{capture_system_context, AuditEventBuilder};
    use brandops_core::{AuditEventType, UserContext};
    use serde_json::json;

    #[test]
    fn email_keeps_two_chars_and_domain() {
        assert_eq!(
            anonymize_text("contact jane.doe@example.com today"),
            "contact ja***@example.com today"
        );
    }

    #[test]
    fn short_local_part_is_still_masked() {
        assert_eq!(anonymize_text("x@mail.co"), "x***@mail.co");
    }

    #[test]
    fn ipv4_keeps_first_two_octets() {
        assert_eq!(anonymize_text("from 192.168.10.42"), "from 192.168.xxx.xxx");
    }

    #[test]
    fn text_without_pii_is_unchanged() {
        assert_eq!(anonymize_text("version 1.2.3 shipped"), "version 1.2.3 shipped");
    }

    #[test]
    fn entry_fields_and_nested_metadata_are_masked() {
        let mut entry = AuditEventBuilder::new(
            AuditEventType::UserLogin,
            "login by sam@brand.io",
            capture_system_context("svc", "test"),
        )
        .user(UserContext {
            user_id: "u-1".to_string(),
            email: Some("sam@brand.io".to_string()),
            ip_address: Some("10.0.0.7".to_string()),
            ..UserContext::default()
        })
        .metadata("contacts", json!(["ops@brand.io", {"ip": "172.16.4.4"}]))
        .metadata("count", 3)
        .build();

        anonymize_entry(&mut entry);

        assert_eq!(entry.message, "login by sa***@brand.io");
        let user = entry.user_context.expect("user");
        assert_eq!(user.email.as_deref(), Some("sa***@brand.io"));
        assert_eq!(user.ip_address.as_deref(), Some("10.0.xxx.xxx"));
        let metadata = entry.metadata.expect("metadata");
        assert_eq!(
            metadata["contacts"],
            json!(["op***@brand.io", {"ip": "172.16.xxx.xxx"}])
        );
        assert_eq!(metadata["count"], json!(3));
    }

    #[test]
    fn mask_email_handles_addresses_without_a_tld() {
        assert_eq!(mask_email("admin@localhost"), "ad***@localhost");
        assert_eq!(mask_email("a@b.c"), "a***@b.c");
        assert_eq!(mask_email("odd@name@host"), "od***@host");
        assert_eq!(mask_email("not-an-email"), "***");
    }

    #[test]
    fn mask_ip_keeps_network_prefix() {
        assert_eq!(mask_ip("10.1.2.3"), "10.1.xxx.xxx");
        assert_eq!(
            mask_ip("2001:db8::1"),
            "2001:db8:xxxx:xxxx:xxxx:xxxx:xxxx:xxxx"
        );
        assert_eq!(mask_ip("garbage"), "xxx");
    }

    #[test]
    fn user_email_and_ipv6_are_masked_on_entry() {
        let mut entry = AuditEventBuilder::new(
            AuditEventType::UserLogin,
            "login",
            capture_system_context("svc", "test"),
        )
        .user(UserContext {
            user_id: "u-2".to_string(),
            email: Some("admin@localhost".to_string()),
            ip_address: Some("2001:db8::1".to_string()),
            ..UserContext::default()
        })
        .build();

        anonymize_entry(&mut entry);

        let user = entry.user_context.expect("user");
        assert_eq!(user.email.as_deref(), Some("ad***@localhost"));
        assert_eq!(
            user.ip_address.as_deref(),
            Some("2001:db8:xxxx:xxxx:xxxx:xxxx:xxxx:xxxx")
        );
    }
}
