use crate::fragment_ions::IonLadder;
use std::ops::{
    Deref,
    DerefMut,
};
use std::sync::Mutex;

/// Fixed pool of ion-ladder scratchpads, one per worker thread.
///
/// Claiming takes the first free slot under the pool mutex; the guard returns
/// it on drop. Pool size equals the worker count, so an empty pool on claim is
/// a programming error, not a runtime condition.
#[derive(Debug)]
pub struct ScratchPool {
    slots: Mutex<Vec<Option<Box<IonLadder>>>>,
}

impl ScratchPool {
    pub fn new(size: usize, template: &IonLadder) -> Self {
        let slots = (0..size)
            .map(|_| Some(Box::new(template.clone())))
            .collect();
        Self {
            slots: Mutex::new(slots),
        }
    }

    pub fn claim(&self) -> ScratchGuard<'_> {
        let mut slots = self.slots.lock().unwrap();
        for (index, slot) in slots.iter_mut().enumerate() {
            if let Some(ladder) = slot.take() {
                return ScratchGuard {
                    pool: self,
                    slot: index,
                    ladder: Some(ladder),
                };
            }
        }
        panic!("no free ion ladder scratchpad in ScratchPool::claim");
    }

    fn release(&self, slot: usize, ladder: Box<IonLadder>) {
        let mut slots = self.slots.lock().unwrap();
        slots[slot] = Some(ladder);
    }
}

#[derive(Debug)]
pub struct ScratchGuard<'a> {
    pool: &'a ScratchPool,
    slot: usize,
    ladder: Option<Box<IonLadder>>,
}

impl Deref for ScratchGuard<'_> {
    type Target = IonLadder;

    fn deref(&self) -> &IonLadder {
        self.ladder.as_ref().unwrap()
    }
}

impl DerefMut for ScratchGuard<'_> {
    fn deref_mut(&mut self) -> &mut IonLadder {
        self.ladder.as_mut().unwrap()
    }
}

impl Drop for ScratchGuard<'_> {
    fn drop(&mut self) {
        if let Some(ladder) = self.ladder.take() {
            self.pool.release(self.slot, ladder);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_release_cycle() {
        let template = IonLadder::new([false, true, false, false, true, false]);
        let pool = ScratchPool::new(2, &template);
        {
            let _a = pool.claim();
            let _b = pool.claim();
        }
        // Both slots returned; claiming twice again succeeds.
        let _c = pool.claim();
        let _d = pool.claim();
    }

    #[test]
    #[should_panic(expected = "no free ion ladder scratchpad")]
    fn test_overclaim_is_fatal() {
        let template = IonLadder::new([false, true, false, false, true, false]);
        let pool = ScratchPool::new(1, &template);
        let _a = pool.claim();
        let _b = pool.claim();
    }
}
