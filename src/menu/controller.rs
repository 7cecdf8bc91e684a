use log::{debug, warn};

use crate::engine::IpFilterEngine;
use crate::menu::{Menu, MenuItem, Selection, StatusDisplay, StatusRow};
use crate::models::filter::FilterState;
use crate::utils::error::FilterResult;

/// Selectable rows of the filter menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuRow {
    IpFilters,
    Arp,
    Rarp,
    NonIp,
    Exit,
}

impl MenuRow {
    /// Map a 1-based menu row to its action; the separator maps to `None`
    pub fn from_index(row: usize) -> Option<Self> {
        match row {
            1 => Some(MenuRow::IpFilters),
            2 => Some(MenuRow::Arp),
            3 => Some(MenuRow::Rarp),
            4 => Some(MenuRow::NonIp),
            6 => Some(MenuRow::Exit),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        match self {
            MenuRow::IpFilters => 1,
            MenuRow::Arp => 2,
            MenuRow::Rarp => 3,
            MenuRow::NonIp => 4,
            MenuRow::Exit => 6,
        }
    }
}

/// Rows of the filter menu, in display order
pub fn filter_menu_items() -> Vec<MenuItem> {
    vec![
        MenuItem::entry("IP...", "Manages IP packet filters", 'i'),
        MenuItem::entry("ARP", "Toggles Address Resolution Protocol filter", 'a'),
        MenuItem::entry("RARP", "Toggles Reverse ARP filter", 'r'),
        MenuItem::entry("Non-IP", "Toggles filter for all other non-IP packets", 'n'),
        MenuItem::Separator,
        MenuItem::entry("Exit menu", "Returns to the filter management menu", 'x'),
    ]
}

/// Inputs driving the menu state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuEvent {
    /// The menu is entered
    Open,
    /// The operator picked a row
    Select(MenuRow),
    /// The operator cancelled, or picked a row with no action
    Abort,
    /// The previous selection has been handled
    Done,
}

/// States of a filter configuration session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuState {
    Idle,
    ShowingMenu,
    RowSelected(MenuRow),
    Aborted,
    Closed,
}

impl MenuState {
    /// Transition function. Events that do not apply to the current state
    /// leave it unchanged.
    pub fn next(self, event: MenuEvent) -> MenuState {
        match (self, event) {
            (MenuState::Idle, MenuEvent::Open) => MenuState::ShowingMenu,
            (MenuState::ShowingMenu, MenuEvent::Select(MenuRow::Exit)) => MenuState::Closed,
            (MenuState::ShowingMenu, MenuEvent::Select(row)) => MenuState::RowSelected(row),
            (MenuState::ShowingMenu, MenuEvent::Abort) => MenuState::Aborted,
            (MenuState::RowSelected(_) | MenuState::Aborted, MenuEvent::Done) => {
                MenuState::ShowingMenu
            }
            (state, _) => state,
        }
    }
}

/// Runs one interactive filter configuration session.
///
/// `ui` supplies both the menu and the status panel. Persisting the result
/// is left to the caller.
pub struct FilterMenu<'a, U, E>
where
    U: Menu + StatusDisplay + ?Sized,
    E: IpFilterEngine + ?Sized,
{
    ui: &'a mut U,
    engine: &'a mut E,
    state: MenuState,
}

impl<'a, U, E> FilterMenu<'a, U, E>
where
    U: Menu + StatusDisplay + ?Sized,
    E: IpFilterEngine + ?Sized,
{
    pub fn new(ui: &'a mut U, engine: &'a mut E) -> Self {
        Self {
            ui,
            engine,
            state: MenuState::Idle,
        }
    }

    pub fn state(&self) -> MenuState {
        self.state
    }

    /// Loop on operator selections until the exit row is chosen
    pub fn run(&mut self, filter: &mut FilterState) -> FilterResult<()> {
        self.step(filter, MenuEvent::Open)?;
        let items = filter_menu_items();

        while self.state != MenuState::Closed {
            self.ui.show(&items)?;
            let event = match self.ui.selection()? {
                Selection::Row(row) => match MenuRow::from_index(row) {
                    Some(row) => MenuEvent::Select(row),
                    None => MenuEvent::Abort,
                },
                Selection::Aborted => MenuEvent::Abort,
            };
            self.step(filter, event)?;

            if matches!(self.state, MenuState::RowSelected(_) | MenuState::Aborted) {
                self.step(filter, MenuEvent::Done)?;
            }
        }

        debug!("Filter menu closed");
        Ok(())
    }

    fn step(&mut self, filter: &mut FilterState, event: MenuEvent) -> FilterResult<()> {
        let next = self.state.next(event);
        debug!("Filter menu {:?} --{:?}--> {:?}", self.state, event, next);

        if let MenuState::RowSelected(row) = next {
            self.apply(filter, row)?;
        }
        self.state = next;
        self.refresh_status(filter)
    }

    fn apply(&mut self, filter: &mut FilterState, row: MenuRow) -> FilterResult<()> {
        match row {
            MenuRow::IpFilters => match filter.apply_ip_filter(&mut *self.engine) {
                Ok(applied) => debug!("IP filter definition finished, applied: {}", applied),
                Err(e) => {
                    warn!("IP filter definition failed: {:#}", e);
                    self.ui.notify(&format!("{:#}", e))?;
                }
            },
            MenuRow::Arp => filter.toggle_arp(),
            MenuRow::Rarp => filter.toggle_rarp(),
            MenuRow::NonIp => filter.toggle_non_ip(),
            MenuRow::Exit => {}
        }
        Ok(())
    }

    fn refresh_status(&mut self, filter: &FilterState) -> FilterResult<()> {
        for row in StatusRow::ALL {
            self.ui.render_status(row, row.label(filter))?;
        }
        Ok(())
    }
}
