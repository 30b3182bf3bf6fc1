//! `cleanlink license verify|status|keygen|issue`.

use anyhow::{bail, Result};
use cleanlink_core::config::CleanlinkConfig;
use cleanlink_core::license::{
    generate_keypair, issue, now_millis, signing_key_from_base64, LicenseState, LicenseVerifier,
};

use crate::cli::LicenseCommand;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

pub fn run_license(cfg: &CleanlinkConfig, action: LicenseCommand) -> Result<()> {
    match action {
        LicenseCommand::Verify { code } => {
            let state = LicenseVerifier::from_config(&cfg.license).verify_now(&code);
            state.save_to_path(&LicenseState::default_path()?)?;
            println!("{}", serde_json::to_string_pretty(&state)?);
            if !state.is_valid() {
                bail!("license is {:?}", state.status);
            }
        }
        LicenseCommand::Status => {
            let path = LicenseState::default_path()?;
            match LicenseState::load_from_path(&path)? {
                Some(state) => println!("{}", serde_json::to_string_pretty(&state)?),
                None => println!("no license verified yet"),
            }
        }
        LicenseCommand::Keygen => {
            let pair = generate_keypair();
            println!("secret_key = {}", pair.secret_key);
            println!("public_key = {}", pair.public_key);
        }
        LicenseCommand::Issue {
            secret_key,
            email,
            days,
        } => {
            if days <= 0 {
                bail!("--days must be positive");
            }
            let signing_key = signing_key_from_base64(&secret_key)?;
            let exp = now_millis() / 1000 + days * SECONDS_PER_DAY;
            println!("{}", issue(&signing_key, &email, exp)?);
        }
    }
    Ok(())
}
