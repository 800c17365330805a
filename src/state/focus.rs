use super::mode::Mode;
use crate::error::SendRejected;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pane {
    #[default]
    RequestList,
    RequestDetail,
    ResponseDetail,
}

impl Pane {
    const ALL: [Pane; 3] = [Pane::RequestList, Pane::RequestDetail, Pane::ResponseDetail];
    const DETAIL: [Pane; 2] = [Pane::RequestDetail, Pane::ResponseDetail];

    pub fn is_detail(self) -> bool {
        !matches!(self, Pane::RequestList)
    }
}

/// How far j/k may move. Supplied by the caller from the current session
/// and rendered pane contents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bounds {
    pub items: usize,
    pub request_lines: usize,
    pub response_lines: usize,
}

/// Pane focus, mode, and the per-pane cursors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusState {
    pub pane: Pane,
    pub mode: Mode,
    pub selected: Option<usize>,
    pub request_scroll: usize,
    pub response_scroll: usize,
    wrap: bool,
}

impl FocusState {
    pub fn new(items: usize, wrap: bool) -> Self {
        Self {
            pane: Pane::RequestList,
            mode: Mode::Normal,
            selected: (items > 0).then_some(0),
            request_scroll: 0,
            response_scroll: 0,
            wrap,
        }
    }

    pub fn move_left(&mut self) {
        self.step(-1);
    }

    pub fn move_right(&mut self) {
        self.step(1);
    }

    fn step(&mut self, delta: isize) {
        // Expanded mode hides the list, so only the two detail panes take part.
        let panes: &[Pane] = match self.mode {
            Mode::Normal => &Pane::ALL,
            Mode::Expanded => &Pane::DETAIL,
        };
        let Some(current) = panes.iter().position(|p| *p == self.pane) else {
            return;
        };
        let len = panes.len() as isize;
        let target = current as isize + delta;
        let target = if self.wrap {
            target.rem_euclid(len)
        } else {
            target.clamp(0, len - 1)
        };
        self.pane = panes[target as usize];
    }

    pub fn move_down(&mut self, bounds: Bounds) {
        match self.pane {
            Pane::RequestList => {
                if bounds.items == 0 {
                    return;
                }
                let next = self.selected.map_or(0, |i| (i + 1).min(bounds.items - 1));
                self.select(next);
            }
            Pane::RequestDetail => {
                self.request_scroll = (self.request_scroll + 1).min(max_scroll(bounds.request_lines));
            }
            Pane::ResponseDetail => {
                self.response_scroll = (self.response_scroll + 1).min(max_scroll(bounds.response_lines));
            }
        }
    }

    pub fn move_up(&mut self) {
        match self.pane {
            Pane::RequestList => {
                if let Some(i) = self.selected {
                    self.select(i.saturating_sub(1));
                }
            }
            Pane::RequestDetail => self.request_scroll = self.request_scroll.saturating_sub(1),
            Pane::ResponseDetail => self.response_scroll = self.response_scroll.saturating_sub(1),
        }
    }

    fn select(&mut self, index: usize) {
        if self.selected != Some(index) {
            self.selected = Some(index);
            self.request_scroll = 0;
            self.response_scroll = 0;
        }
    }

    /// Returns false (and changes nothing) when the list is focused.
    pub fn toggle_expanded(&mut self) -> bool {
        if !self.pane.is_detail() {
            return false;
        }
        self.mode = match self.mode {
            Mode::Normal => Mode::Expanded,
            Mode::Expanded => Mode::Normal,
        };
        true
    }

    /// The template a send acts on: the list selection, in Normal mode only.
    pub fn send_target(&self) -> Result<usize, SendRejected> {
        if self.mode == Mode::Expanded {
            return Err(SendRejected::Expanded);
        }
        self.selected.ok_or(SendRejected::NoSelection)
    }

    pub fn scroll(&self, pane: Pane) -> usize {
        match pane {
            Pane::RequestList => 0,
            Pane::RequestDetail => self.request_scroll,
            Pane::ResponseDetail => self.response_scroll,
        }
    }

    /// Pull scroll offsets back inside the content, e.g. after a new
    /// response replaced a longer one.
    pub fn clamp_scroll(&mut self, bounds: Bounds) {
        self.request_scroll = self.request_scroll.min(max_scroll(bounds.request_lines));
        self.response_scroll = self.response_scroll.min(max_scroll(bounds.response_lines));
    }
}

fn max_scroll(lines: usize) -> usize {
    lines.saturating_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(items: usize) -> Bounds {
        Bounds {
            items,
            request_lines: 5,
            response_lines: 3,
        }
    }

    #[test]
    fn test_initial_state() {
        let focus = FocusState::new(3, false);
        assert_eq!(focus.pane, Pane::RequestList);
        assert_eq!(focus.mode, Mode::Normal);
        assert_eq!(focus.selected, Some(0));
        assert_eq!(FocusState::new(0, false).selected, None);
    }

    #[test]
    fn test_horizontal_moves_are_bounded() {
        let mut focus = FocusState::new(1, false);
        focus.move_left();
        assert_eq!(focus.pane, Pane::RequestList);
        focus.move_right();
        focus.move_right();
        assert_eq!(focus.pane, Pane::ResponseDetail);
        focus.move_right();
        assert_eq!(focus.pane, Pane::ResponseDetail);
    }

    #[test]
    fn test_horizontal_moves_wrap_when_configured() {
        let mut focus = FocusState::new(1, true);
        focus.move_left();
        assert_eq!(focus.pane, Pane::ResponseDetail);
        focus.move_right();
        assert_eq!(focus.pane, Pane::RequestList);
    }

    #[test]
    fn test_expanded_moves_stay_on_detail_panes() {
        let mut focus = FocusState::new(1, true);
        focus.move_right();
        assert!(focus.toggle_expanded());
        focus.move_right();
        assert_eq!(focus.pane, Pane::ResponseDetail);
        focus.move_right();
        assert_eq!(focus.pane, Pane::RequestDetail);
        focus.move_left();
        assert_eq!(focus.pane, Pane::ResponseDetail);
    }

    #[test]
    fn test_expand_on_request_list_is_a_no_op() {
        let mut focus = FocusState::new(2, false);
        let before = focus.clone();
        assert!(!focus.toggle_expanded());
        assert_eq!(focus, before);
    }

    #[test]
    fn test_expand_toggles_on_detail_panes() {
        let mut focus = FocusState::new(2, false);
        focus.move_right();
        assert!(focus.toggle_expanded());
        assert_eq!(focus.mode, Mode::Expanded);
        assert!(focus.toggle_expanded());
        assert_eq!(focus.mode, Mode::Normal);
    }

    #[test]
    fn test_selection_is_clamped_and_resets_scroll() {
        let mut focus = FocusState::new(2, false);
        focus.response_scroll = 2;
        focus.move_down(bounds(2));
        assert_eq!(focus.selected, Some(1));
        assert_eq!(focus.response_scroll, 0);
        focus.move_down(bounds(2));
        assert_eq!(focus.selected, Some(1));
        focus.move_up();
        focus.move_up();
        assert_eq!(focus.selected, Some(0));
    }

    #[test]
    fn test_detail_scroll_is_clamped() {
        let mut focus = FocusState::new(1, false);
        focus.move_right();
        focus.move_right();
        for _ in 0..10 {
            focus.move_down(bounds(1));
        }
        assert_eq!(focus.response_scroll, 2);
        assert_eq!(focus.request_scroll, 0);
        focus.move_up();
        assert_eq!(focus.scroll(Pane::ResponseDetail), 1);

        focus.clamp_scroll(Bounds {
            items: 1,
            request_lines: 0,
            response_lines: 1,
        });
        assert_eq!(focus.response_scroll, 0);
    }

    #[test]
    fn test_send_target() {
        let mut focus = FocusState::new(2, false);
        focus.move_down(bounds(2));
        focus.move_right();
        assert_eq!(focus.send_target(), Ok(1));

        focus.toggle_expanded();
        assert_eq!(focus.send_target(), Err(SendRejected::Expanded));
        assert_eq!(
            FocusState::new(0, false).send_target(),
            Err(SendRejected::NoSelection)
        );
    }
}
