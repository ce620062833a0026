#[cfg(feature = "rtrb")]
use rtrb::Consumer;

use super::bernoulli::{OutMode, TossMode};
use crate::generator::{GeneratorMode, GeneratorRange};

/// Mode changes sent from a control thread to the audio thread.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ModuleMessage {
    SetTossMode { channel: usize, mode: TossMode },
    SetOutMode { channel: usize, mode: OutMode },
    SetGeneratorMode(GeneratorMode),
    SetRange(GeneratorRange),
    SetWavetable(bool),
    ResetBernoulli,
    ResetGenerator,
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<ModuleMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<ModuleMessage> {
    fn pop(&mut self) -> Option<ModuleMessage> {
        Consumer::pop(self).ok()
    }
}

/// Anything that reacts to [`ModuleMessage`]s. Messages meant for another
/// module are ignored.
pub trait MessageTarget {
    fn apply(&mut self, message: &ModuleMessage);
}

/// Drain every pending message into both modules.
pub fn drain<M, A, B>(receiver: &mut M, first: &mut A, second: &mut B)
where
    M: MessageReceiver + ?Sized,
    A: MessageTarget + ?Sized,
    B: MessageTarget + ?Sized,
{
    while let Some(message) = receiver.pop() {
        first.apply(&message);
        second.apply(&message);
    }
}
