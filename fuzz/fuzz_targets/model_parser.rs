#![no_main]

use libfuzzer_sys::fuzz_target;
use qmverify::config::VerifierConfig;
use qmverify::model::DensityModel;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Neither loader may panic on arbitrary TOML
        let _ = DensityModel::from_toml_str(input);
        let _ = VerifierConfig::from_toml_str(input);
    }
});
