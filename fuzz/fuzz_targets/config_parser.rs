#![no_main]

use libfuzzer_sys::fuzz_target;
use moonwatch::config::ProfilerConfig;
use moonwatch::Path;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Parsing and validation must never panic
        if let Ok(config) = ProfilerConfig::from_toml_str(input) {
            if config.validate().is_ok() {
                let _ = config.build_denylist();
                let _ = config.root_path();
            }
        }

        let path = Path::parse_dotted(input);
        assert_eq!(path.to_string(), input);
    }
});
