#![no_main]

use ecs_rollout::domain::value_objects::{ImageRef, TaskRef};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(task) = TaskRef::parse(input) {
            // Anything accepted must print back to something that parses the same way
            assert_eq!(TaskRef::parse(&task.to_string()).ok(), Some(task));
        }
        let image = ImageRef::parse(input);
        let _ = image.with_tag("fuzz").to_string();
    }
});
