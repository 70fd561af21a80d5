use rand::{distributions::Alphanumeric, Rng};

const ID_LEN: usize = 8;

/// Short, locally unique identifier for lists and tasks.
///
/// Not cryptographically unique; 36^8 combinations is plenty for one board.
pub fn new_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .map(|b| char::from(b).to_ascii_lowercase())
        .take(ID_LEN)
        .collect()
}
