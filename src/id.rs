use std::sync::{LazyLock, Mutex};

use ulid::Generator;

static GENERATOR: LazyLock<Mutex<Generator>> =
    LazyLock::new(|| Mutex::new(Generator::new()));

/// Returns a new 26-character Crockford base32 ULID: 48 bits of millisecond
/// time followed by 80 bits of entropy.
///
/// The entropy source is process-wide and monotonic, so two ids generated in
/// the same millisecond still compare in strictly increasing lexicographic
/// order. Safe to call from concurrent tasks.
pub fn new_id() -> String {
    let mut generator = GENERATOR.lock().unwrap();
    loop {
        match generator.generate() {
            Ok(id) => return id.to_string(),
            // The 80-bit entropy counter overflowed within one millisecond;
            // wait for the next tick.
            Err(ulid::MonotonicError::Overflow) => {
                std::thread::sleep(std::time::Duration::from_millis(1));
            }
        }
    }
}
