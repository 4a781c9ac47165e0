use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rodio::{Sample, Source};

/*
 * Repeats its input for as long as the shared flag is set. Clearing the flag
 * doesn't cut the sound off: the cycle in progress plays out, then the source
 * ends and the sink holding it drains.
 */
pub struct LoopingSource<I> {
    input: I,
    current: I,
    looping: Arc<AtomicBool>,
}

impl<I> LoopingSource<I>
where
    I: Source + Clone,
    I::Item: Sample,
{
    pub fn new(input: I, looping: Arc<AtomicBool>) -> Self {
        LoopingSource {
            current: input.clone(),
            input,
            looping,
        }
    }

    pub fn is_looping(&self) -> bool {
        self.looping.load(Ordering::Relaxed)
    }
}

impl<I> Iterator for LoopingSource<I>
where
    I: Source + Clone,
    I::Item: Sample,
{
    type Item = <I as Iterator>::Item;

    fn next(&mut self) -> Option<<I as Iterator>::Item> {
        if let Some(sample) = self.current.next() {
            return Some(sample);
        }

        if !self.is_looping() {
            return None;
        }

        self.current = self.input.clone();
        self.current.next()
    }
}

impl<I> Source for LoopingSource<I>
where
    I: Iterator + Source + Clone,
    I::Item: Sample,
{
    #[inline]
    fn current_frame_len(&self) -> Option<usize> {
        self.current.current_frame_len()
    }

    #[inline]
    fn channels(&self) -> u16 {
        self.current.channels()
    }

    #[inline]
    fn sample_rate(&self) -> u32 {
        self.current.sample_rate()
    }

    // unknown until the flag is cleared
    #[inline]
    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rodio::buffer::SamplesBuffer;

    fn cycle() -> rodio::source::Buffered<SamplesBuffer<i16>> {
        SamplesBuffer::new(1, 44100, vec![1i16, 2, 3]).buffered()
    }

    #[test]
    fn test_repeats_while_flag_is_set() {
        let flag = Arc::new(AtomicBool::new(true));
        let source = LoopingSource::new(cycle(), flag);

        let samples: Vec<i16> = source.take(7).collect();
        assert_eq!(samples, vec![1, 2, 3, 1, 2, 3, 1]);
    }

    #[test]
    fn test_finishes_the_current_cycle_after_flag_clears() {
        let flag = Arc::new(AtomicBool::new(true));
        let mut source = LoopingSource::new(cycle(), flag.clone());

        assert_eq!(source.next(), Some(1));
        assert_eq!(source.next(), Some(2));
        assert_eq!(source.next(), Some(3));
        assert_eq!(source.next(), Some(1));
        flag.store(false, Ordering::Relaxed);

        let rest: Vec<i16> = source.collect();
        assert_eq!(rest, vec![2, 3]);
    }
}
