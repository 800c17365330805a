use crossterm::event::KeyEvent;

use crate::state::response_state::{PostscriptReport, ResponseRecord};

#[derive(Debug)]
pub enum Event {
    Key(KeyEvent),
    Resize(u16, u16),
    /// A send task finished: the response plus the postscript outcome, if
    /// the template has one.
    Dispatched {
        index: usize,
        record: ResponseRecord,
        postscript: Option<PostscriptReport>,
    },
}
