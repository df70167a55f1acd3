/// One input line travelling through the pipeline.
///
/// The `index` is assigned once at ingestion and identifies the line's position
/// in the original input. The payload may be replaced by any stage, or become
/// absent when a stage filters the record; an absent record still flows to the
/// sink so ordering can advance past its index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    index: u64,
    payload: Option<Vec<u8>>,
}

impl Record {
    #[must_use]
    pub fn new(index: u64, payload: Vec<u8>) -> Self {
        Self {
            index,
            payload: Some(payload),
        }
    }

    /// A record whose payload has been filtered out.
    #[must_use]
    pub fn absent(index: u64) -> Self {
        Self { index, payload: None }
    }

    #[must_use]
    pub fn index(&self) -> u64 {
        self.index
    }

    #[must_use]
    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    #[must_use]
    pub fn is_absent(&self) -> bool {
        self.payload.is_none()
    }

    /// Take the payload out, leaving the record absent.
    pub fn take_payload(&mut self) -> Option<Vec<u8>> {
        self.payload.take()
    }

    /// Replace the payload with the output of a stage.
    pub fn set_payload(&mut self, payload: Option<Vec<u8>>) {
        self.payload = payload;
    }

    /// Payload length in bytes; zero for absent records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.payload.as_ref().map_or(0, Vec::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
