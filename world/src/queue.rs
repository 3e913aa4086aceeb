use stream_siege_core::{QueueTicket, QueuedUnit, ViewerId};

/// Summoned units waiting to be placed, in arrival order.
#[derive(Debug, Default)]
pub(crate) struct PlacementQueue {
    entries: Vec<(QueueTicket, QueuedUnit)>,
    dragging: Option<(QueueTicket, QueuedUnit)>,
    next_ticket: u32,
}

impl PlacementQueue {
    pub(crate) fn push(&mut self, unit: QueuedUnit) -> QueueTicket {
        let ticket = QueueTicket::new(self.next_ticket);
        self.next_ticket = self.next_ticket.wrapping_add(1);
        self.entries.push((ticket, unit));
        ticket
    }

    /// Entries waiting, excluding a dragged entry.
    pub(crate) fn waiting(&self) -> usize {
        self.entries.len()
    }

    /// Entries held by the queue including a dragged entry.
    pub(crate) fn held(&self) -> usize {
        self.entries.len() + usize::from(self.dragging.is_some())
    }

    pub(crate) fn held_by(&self, viewer: &ViewerId) -> usize {
        self.entries
            .iter()
            .chain(self.dragging.iter())
            .filter(|(_, unit)| &unit.viewer == viewer)
            .count()
    }

    pub(crate) fn take(&mut self, ticket: QueueTicket) -> Option<QueuedUnit> {
        let index = self
            .entries
            .iter()
            .position(|(candidate, _)| *candidate == ticket)?;
        Some(self.entries.remove(index).1)
    }

    pub(crate) fn tickets(&self) -> Vec<QueueTicket> {
        self.entries.iter().map(|(ticket, _)| *ticket).collect()
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (QueueTicket, &QueuedUnit)> {
        self.entries.iter().map(|(ticket, unit)| (*ticket, unit))
    }

    pub(crate) fn dragging(&self) -> Option<(QueueTicket, &QueuedUnit)> {
        self.dragging.as_ref().map(|(ticket, unit)| (*ticket, unit))
    }

    /// Moves an entry into the drag slot.
    pub(crate) fn begin_drag(&mut self, ticket: QueueTicket) -> bool {
        if self.dragging.is_some() {
            return false;
        }
        match self.take(ticket) {
            Some(unit) => {
                self.dragging = Some((ticket, unit));
                true
            }
            None => false,
        }
    }

    pub(crate) fn take_dragged(&mut self) -> Option<(QueueTicket, QueuedUnit)> {
        self.dragging.take()
    }

    /// Returns the dragged entry to its original slot.
    pub(crate) fn restore(&mut self, ticket: QueueTicket, unit: QueuedUnit) {
        let index = self
            .entries
            .iter()
            .position(|(candidate, _)| *candidate > ticket)
            .unwrap_or(self.entries.len());
        self.entries.insert(index, (ticket, unit));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stream_siege_core::{Appearance, UnitType};

    #[test]
    fn cancelled_drag_returns_entry_to_its_slot() {
        let mut queue = PlacementQueue::default();
        let first = queue.push(QueuedUnit::new(UnitType::Warrior, "a", ViewerId::new("a")));
        let second = queue.push(
            QueuedUnit::new(UnitType::Mage, "b", ViewerId::new("b"))
                .with_appearance(Appearance::new(7)),
        );
        let third = queue.push(QueuedUnit::new(UnitType::Monk, "c", ViewerId::new("c")));

        assert!(queue.begin_drag(second));
        assert!(!queue.begin_drag(first));
        assert_eq!(queue.waiting(), 2);
        assert_eq!(queue.held(), 3);
        assert_eq!(queue.held_by(&ViewerId::new("b")), 1);

        let (ticket, unit) = queue.take_dragged().expect("dragged entry");
        queue.restore(ticket, unit);
        assert_eq!(queue.tickets(), vec![first, second, third]);
        let restored = queue
            .entries()
            .find(|(ticket, _)| *ticket == second)
            .map(|(_, unit)| unit.appearance);
        assert_eq!(restored, Some(Appearance::new(7)));
    }
}
