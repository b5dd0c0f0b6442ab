//! Common validation utilities.

use validator::ValidationError;

lazy_static::lazy_static! {
    /// Plain lower-case SQL identifier (table or column name).
    static ref IDENTIFIER_REGEX: regex::Regex =
        regex::Regex::new(r"^[a-z_][a-z0-9_]{0,62}$").unwrap();

    /// URL-friendly slug.
    pub static ref SLUG_REGEX: regex::Regex =
        regex::Regex::new(r"^[a-z0-9][a-z0-9-]*[a-z0-9]$").unwrap();
}

/// Returns true if `name` can be interpolated into SQL as an unquoted identifier.
pub fn is_sql_identifier(name: &str) -> bool {
    IDENTIFIER_REGEX.is_match(name)
}

/// Validates a slug (lowercase alphanumerics and inner hyphens).
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if SLUG_REGEX.is_match(slug) {
        Ok(())
    } else {
        let mut err = ValidationError::new("invalid_slug");
        err.message = Some(
            "Slug may only contain lowercase letters, digits and hyphens, and must not start or end with a hyphen".into(),
        );
        Err(err)
    }
}

/// Validates an IPv4/IPv6 address with optional prefix length (`10.0.0.1/24`).
pub fn validate_ip_interface(value: &str) -> Result<(), ValidationError> {
    let (addr, prefix) = match value.split_once('/') {
        Some((addr, prefix)) => (addr, Some(prefix)),
        None => (value, None),
    };

    let parsed: Result<std::net::IpAddr, _> = addr.parse();
    let max_prefix = match parsed {
        Ok(std::net::IpAddr::V4(_)) => 32,
        Ok(std::net::IpAddr::V6(_)) => 128,
        Err(_) => return Err(ip_error()),
    };

    match prefix {
        None => Ok(()),
        Some(p) => match p.parse::<u8>() {
            Ok(len) if len <= max_prefix => Ok(()),
            _ => Err(ip_error()),
        },
    }
}

fn ip_error() -> ValidationError {
    let mut err = ValidationError::new("invalid_ip_address");
    err.message = Some("Must be an IP address with optional prefix length, e.g. 10.0.0.1/24".into());
    err
}

/// Validates a MAC address in colon notation (`aa:bb:cc:dd:ee:ff`).
pub fn validate_mac_address(value: &str) -> Result<(), ValidationError> {
    let parts: Vec<&str> = value.split(':').collect();
    let valid = parts.len() == 6
        && parts
            .iter()
            .all(|p| p.len() == 2 && p.chars().all(|c| c.is_ascii_hexdigit()));
    if valid {
        Ok(())
    } else {
        let mut err = ValidationError::new("invalid_mac_address");
        err.message = Some("MAC address must look like aa:bb:cc:dd:ee:ff".into());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_identifier() {
        assert!(is_sql_identifier("devices"));
        assert!(is_sql_identifier("ip_addresses"));
        assert!(is_sql_identifier("_hidden"));
        assert!(!is_sql_identifier("Devices"));
        assert!(!is_sql_identifier("1devices"));
        assert!(!is_sql_identifier("devices; DROP TABLE users"));
        assert!(!is_sql_identifier(""));
        assert!(!is_sql_identifier(&"a".repeat(64)));
    }

    #[test]
    fn test_valid_slugs() {
        assert!(validate_slug("ams-01").is_ok());
        assert!(validate_slug("dc2").is_ok());
    }

    #[test]
    fn test_invalid_slugs() {
        assert!(validate_slug("-ams").is_err());
        assert!(validate_slug("ams-").is_err());
        assert!(validate_slug("AMS").is_err());
        assert!(validate_slug("a").is_err());
    }

    #[test]
    fn test_ip_interface() {
        assert!(validate_ip_interface("10.0.0.1").is_ok());
        assert!(validate_ip_interface("10.0.0.1/24").is_ok());
        assert!(validate_ip_interface("2001:db8::1/64").is_ok());
        assert!(validate_ip_interface("10.0.0.1/33").is_err());
        assert!(validate_ip_interface("10.0.0.300").is_err());
        assert!(validate_ip_interface("router").is_err());
    }

    #[test]
    fn test_mac_address() {
        assert!(validate_mac_address("aa:bb:cc:dd:ee:ff").is_ok());
        assert!(validate_mac_address("AA:BB:CC:00:11:22").is_ok());
        assert!(validate_mac_address("aa-bb-cc-dd-ee-ff").is_err());
        assert!(validate_mac_address("aa:bb:cc:dd:ee").is_err());
        assert!(validate_mac_address("zz:bb:cc:dd:ee:ff").is_err());
    }
}
