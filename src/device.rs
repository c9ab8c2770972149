// Device identity sent with every request as `X-FaceApp-DeviceID`.

use rand::Rng;

/// Length of a generated device id.
pub const DEVICE_ID_LENGTH: usize = 8;

/// Generate a random device id of `length` lowercase ASCII letters.
///
/// Each character is drawn independently, so letters may repeat and two
/// generated ids are not guaranteed to differ.
pub fn generate_device_id(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(rng.gen_range(b'a'..=b'z')))
        .collect()
}
