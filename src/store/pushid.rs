use parking_lot::Mutex;
use rand::Rng;

// Byte order of this alphabet matches index order, so ids compare like their timestamps.
const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

pub const PUSH_ID_LEN: usize = 20;

#[derive(Default)]
struct State {
    last_millis: i64,
    tail: [u8; 12],
}

/// Mints unique, order-preserving child keys.
#[derive(Default)]
pub struct PushIds {
    state: Mutex<State>,
}

impl PushIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self, now_millis: i64) -> String {
        let mut state = self.state.lock();

        if now_millis > state.last_millis {
            state.last_millis = now_millis;
            let mut rng = rand::rng();
            for digit in state.tail.iter_mut() {
                *digit = rng.random_range(0..64);
            }
        } else {
            // same millisecond or the clock stepped back
            for digit in state.tail.iter_mut().rev() {
                if *digit == 63 {
                    *digit = 0;
                } else {
                    *digit += 1;
                    break;
                }
            }
        }

        let mut id = [0u8; PUSH_ID_LEN];
        let mut stamp = state.last_millis.max(0);
        for slot in id[..8].iter_mut().rev() {
            *slot = PUSH_CHARS[(stamp % 64) as usize];
            stamp /= 64;
        }
        for (slot, digit) in id[8..].iter_mut().zip(state.tail) {
            *slot = PUSH_CHARS[digit as usize];
        }

        id.iter().map(|&b| b as char).collect()
    }
}
