//! The machine stack.
//!
//! The stack lives in the top 256 words of memory and grows downward. SP
//! points at the next free slot: a push writes at SP and then decrements it,
//! a pop increments SP and then reads. SP never leaves the region, so the
//! word at `STACK_BOTTOM` is never written and 255 values fit.

use crate::error::{Fault, Result, StackFaultKind};
use crate::memory::{Memory, Word, MEMORY_SIZE};

/// Lowest address of the stack region
pub const STACK_BOTTOM: Word = (MEMORY_SIZE - 0x100) as Word;
/// Highest address of the stack region, and the initial SP
pub const STACK_TOP: Word = (MEMORY_SIZE - 1) as Word;

/// Pushes `value`, moving `sp` down by one.
///
/// On failure neither `sp` nor the memory is touched.
pub fn push(memory: &mut Memory, sp: &mut Word, value: Word) -> Result<()> {
    if *sp <= STACK_BOTTOM || *sp > STACK_TOP {
        return Err(Fault::StackFault {
            kind: StackFaultKind::Overflow,
            sp: *sp,
        });
    }

    memory.write(*sp, value)?;
    *sp -= 1;
    Ok(())
}

/// Pops a value, moving `sp` up by one.
///
/// On failure `sp` is left untouched.
pub fn pop(memory: &Memory, sp: &mut Word) -> Result<Word> {
    if *sp >= STACK_TOP || *sp < STACK_BOTTOM {
        return Err(Fault::StackFault {
            kind: StackFaultKind::Underflow,
            sp: *sp,
        });
    }

    let value = memory.read(*sp + 1)?;
    *sp += 1;
    Ok(value)
}

/// Number of values currently on the stack
pub fn depth(sp: Word) -> usize {
    if (STACK_BOTTOM..=STACK_TOP).contains(&sp) {
        (STACK_TOP - sp) as usize
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use color_eyre::eyre::Result;
    use proptest::prelude::*;

    #[test]
    fn test_push_writes_then_decrements() -> Result<()> {
        let mut mem = Memory::default();
        let mut sp = STACK_TOP;

        push(&mut mem, &mut sp, 42)?;

        assert_eq!(mem.read(STACK_TOP)?, 42);
        assert_eq!(sp, STACK_TOP - 1);
        assert_eq!(depth(sp), 1);

        Ok(())
    }

    #[test]
    fn test_lifo_order() -> Result<()> {
        let mut mem = Memory::default();
        let mut sp = STACK_TOP;

        push(&mut mem, &mut sp, 1)?;
        push(&mut mem, &mut sp, 2)?;
        push(&mut mem, &mut sp, 3)?;

        assert_eq!(pop(&mem, &mut sp)?, 3);
        assert_eq!(pop(&mem, &mut sp)?, 2);
        assert_eq!(pop(&mem, &mut sp)?, 1);
        assert_eq!(sp, STACK_TOP);

        Ok(())
    }

    #[test]
    fn test_underflow() {
        let mem = Memory::default();
        let mut sp = STACK_TOP;

        assert_eq!(
            pop(&mem, &mut sp),
            Err(Fault::StackFault {
                kind: StackFaultKind::Underflow,
                sp: STACK_TOP
            })
        );
        assert_eq!(sp, STACK_TOP);
    }

    #[test]
    fn test_overflow() -> Result<()> {
        let mut mem = Memory::default();
        let mut sp = STACK_TOP;

        for i in 0..255 {
            push(&mut mem, &mut sp, i)?;
        }
        assert_eq!(sp, STACK_BOTTOM);
        assert_eq!(depth(sp), 255);

        let before = mem.clone();
        assert_eq!(
            push(&mut mem, &mut sp, 0xFFFF),
            Err(Fault::StackFault {
                kind: StackFaultKind::Overflow,
                sp: STACK_BOTTOM
            })
        );
        assert_eq!(sp, STACK_BOTTOM);
        assert_eq!(mem, before);

        Ok(())
    }

    #[test]
    fn test_sp_outside_region() {
        let mut mem = Memory::default();
        let mut sp = 0x0100;

        assert!(push(&mut mem, &mut sp, 1).is_err());
        assert!(pop(&mem, &mut sp).is_err());
        assert_eq!(sp, 0x0100);
        assert_eq!(depth(sp), 0);
    }

    proptest! {
        #[test]
        fn test_push_then_pop_restores(value in any::<Word>(), sp in STACK_BOTTOM + 1..=STACK_TOP) {
            let mut mem = Memory::default();
            let mut cur = sp;

            push(&mut mem, &mut cur, value).unwrap();
            prop_assert_eq!(pop(&mem, &mut cur).unwrap(), value);
            prop_assert_eq!(cur, sp);
        }
    }
}
