use folio_core::sync::DeviceIdentity;

use crate::commands::common::{open_state_store, resolve_profile};
use crate::error::CliError;

pub fn run_device(profile: Option<&str>) -> Result<(), CliError> {
    let (_, profile_name) = resolve_profile(profile)?;
    let device = DeviceIdentity::new(open_state_store(&profile_name)?);
    println!("{}", device.device_id());
    Ok(())
}
