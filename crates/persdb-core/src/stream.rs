//! Lazy, cancellable iteration over a tree's insertion order (C6).
//!
//! A [`RevisionStream`] wraps a materialized, snapshot-ordered sequence of
//! revisions (produced by [`crate::tree::Tree::iterate_insertion_order`])
//! with pause/resume/destroy semantics and an optional [`Selector`] filter.
//! [`ConcatStream`] chains several such sequences end to end.
use crate::revision::Revision;
use crate::selector::Selector;

/// One event a stream can emit, matching §4.6's `data`/`error`/`close` set.
#[derive(Debug)]
pub enum StreamEvent {
    Data(Revision),
    Error(String),
    Close,
}

/// A single paused/resumable/cancellable sequence over one source.
pub struct RevisionStream {
    items: std::vec::IntoIter<Revision>,
    filter: Option<Selector>,
    paused: bool,
    buffered: Option<Revision>,
    destroyed: bool,
    closed: bool,
}

impl RevisionStream {
    pub fn new(items: Vec<Revision>, filter: Option<Selector>) -> Self {
        Self {
            items: items.into_iter(),
            filter,
            paused: false,
            buffered: None,
            destroyed: false,
            closed: false,
        }
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Idempotent cancellation; any subsequent `next` yields a single
    /// `Close` and nothing else.
    pub fn destroy(&mut self) {
        self.destroyed = true;
        self.buffered = None;
    }

    fn passes(&self, rev: &Revision) -> bool {
        self.filter
            .as_ref()
            .is_none_or(|selector| selector.matches(&rev.body))
    }

    /// Advances the stream by one event. While paused, at most one item is
    /// buffered ahead and no further `Data` events are produced until
    /// `resume`; a buffered item is delivered first on resume.
    pub fn next_event(&mut self) -> StreamEvent {
        if self.destroyed {
            return if self.closed {
                StreamEvent::Close
            } else {
                self.closed = true;
                StreamEvent::Close
            };
        }

        if let Some(buffered) = self.buffered.take() {
            if self.paused {
                self.buffered = Some(buffered);
                return StreamEvent::Close;
            }
            return StreamEvent::Data(buffered);
        }

        loop {
            match self.items.next() {
                Some(rev) if self.passes(&rev) => {
                    if self.paused {
                        self.buffered = Some(rev);
                        return StreamEvent::Close;
                    }
                    return StreamEvent::Data(rev);
                }
                Some(_) => continue,
                None => {
                    self.closed = true;
                    return StreamEvent::Close;
                }
            }
        }
    }
}

/// Streams an ordered list of sources in turn, source by source, in the
/// order given. Descending order is a property of each source's own item
/// order (the caller builds every [`RevisionStream`] already reversed, per
/// S6's `[B,A,D,C]` for sources `S1=[A,B]` then `S2=[C,D]`), never of which
/// source runs first.
pub struct ConcatStream {
    sources: std::collections::VecDeque<RevisionStream>,
}

impl ConcatStream {
    pub fn new(sources: Vec<RevisionStream>) -> Self {
        Self {
            sources: sources.into(),
        }
    }

    pub fn pause(&mut self) {
        if let Some(active) = self.sources.front_mut() {
            active.pause();
        }
    }

    pub fn resume(&mut self) {
        if let Some(active) = self.sources.front_mut() {
            active.resume();
        }
    }

    pub fn destroy(&mut self) {
        for source in &mut self.sources {
            source.destroy();
        }
    }

    pub fn next_event(&mut self) -> StreamEvent {
        loop {
            let Some(active) = self.sources.front_mut() else {
                return StreamEvent::Close;
            };
            match active.next_event() {
                StreamEvent::Data(rev) => return StreamEvent::Data(rev),
                StreamEvent::Error(e) => return StreamEvent::Error(e),
                StreamEvent::Close if active.is_paused() => return StreamEvent::Close,
                StreamEvent::Close => {
                    self.sources.pop_front();
                    if self.sources.is_empty() {
                        return StreamEvent::Close;
                    }
                }
            }
        }
    }
}
