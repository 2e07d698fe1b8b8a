use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use tf_provider::schema::Schema;

pub(crate) trait WithSchema {
    fn schema() -> Schema;
}

/// Random identifier given to data source reads
pub(crate) fn unique_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(30)
        .map(char::from)
        .collect()
}
