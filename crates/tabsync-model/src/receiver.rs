/// Push-style consumer used for diagnostics and row side channels.
///
/// Any `FnMut(T)` closure is a receiver, so callers can collect into a list,
/// count, or forward without a dedicated type.
pub trait Receiver<T> {
    fn receive(&mut self, item: T);
}

impl<T, F> Receiver<T> for F
where
    F: FnMut(T),
{
    fn receive(&mut self, item: T) {
        self(item)
    }
}

/// Receiver that drops everything it is given.
#[derive(Debug, Clone, Copy, Default)]
pub struct Discard;

impl<T> Receiver<T> for Discard {
    fn receive(&mut self, _item: T) {}
}
