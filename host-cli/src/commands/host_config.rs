use std::fs;
use std::path::Path;

use shared::DeviceProfile;

use crate::error::CliError;

/// Load a device profile from a JSON file.
///
/// Only `name`, `family`, `vendor_id` and `product_id` are required; the remaining fields
/// fall back to the same defaults as the built-in presets.
pub fn load_profile(path: &Path) -> Result<DeviceProfile, CliError> {
    let raw = fs::read_to_string(path).map_err(|source| CliError::ProfileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let profile: DeviceProfile =
        serde_json::from_str(&raw).map_err(|source| CliError::ProfileFormat {
            path: path.to_path_buf(),
            source,
        })?;
    profile
        .master_value()
        .map_err(|err| CliError::Vault(err.into()))?;
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use shared::DeviceFamily;
    use shared::device::VAULT_MASTER_VALUE_HEX;

    use super::*;

    #[test]
    fn minimal_profile_gets_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("profile.json");
        fs::write(
            &path,
            r#"{"name":"KEEPKEY","family":"keepkey","vendor_id":11044,"product_id":2}"#,
        )
        .expect("write profile");

        let profile = load_profile(&path).expect("load");
        assert_eq!(profile.family, DeviceFamily::Keepkey);
        assert_eq!(profile.product_id, 2);
        assert_eq!(profile.interface, 0);
        assert_eq!(profile.channel_marker, 63);
        assert_eq!(profile.master_value_hex, VAULT_MASTER_VALUE_HEX);
    }

    #[test]
    fn bad_master_value_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("profile.json");
        fs::write(
            &path,
            r#"{"name":"X","family":"trezor","vendor_id":1,"product_id":1,"master_value_hex":"zz"}"#,
        )
        .expect("write profile");

        assert!(matches!(load_profile(&path), Err(CliError::Vault(_))));
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_profile(&dir.path().join("absent.json")).expect_err("missing");
        assert!(err.to_string().contains("absent.json"));
    }
}
