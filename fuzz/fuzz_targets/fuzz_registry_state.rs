#![no_main]

use ecs_rollout::infrastructure::RegistryState;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // A corrupted state file must be rejected, not crash the loader
    let _ = serde_json::from_slice::<RegistryState>(data);
});
