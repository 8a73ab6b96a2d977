use std::io::Write;

use softz80_lib::Registers;

use crate::{diff::DiffRuns, AppResult};

/*
 * Serializes one finished test into the output protocol: name line, the
 * register snapshot laid out exactly like the input (pairs line, then
 * I R IFF1 IFF2 IM halted tstates), one line per differing memory run and
 * a closing blank line. A test that touched no memory emits no run lines.
 */
pub fn dump<W>(
    output: &mut W,
    name: &str,
    registers: &Registers,
    tstates: u64,
    pre: &[u8],
    post: &[u8],
) -> AppResult<()>
where
    W: Write,
{
    writeln!(output, "{name}")?;
    writeln!(
        output,
        "{:04x} {:04x} {:04x} {:04x} {:04x} {:04x} {:04x} {:04x} {:04x} {:04x} {:04x} {:04x}",
        registers.af(),
        registers.bc(),
        registers.de(),
        registers.hl(),
        registers.af_alt(),
        registers.bc_alt(),
        registers.de_alt(),
        registers.hl_alt(),
        registers.ix,
        registers.iy,
        registers.sp,
        registers.pc,
    )?;
    writeln!(
        output,
        "{:02x} {:02x} {} {} {} {} {}",
        registers.i,
        registers.r,
        registers.iff1 as u8,
        registers.iff2 as u8,
        registers.im,
        registers.halted as u8,
        tstates,
    )?;

    for run in DiffRuns::new(pre, post) {
        write!(output, "{:04x} ", run.address)?;
        for byte in &run.bytes {
            write!(output, "{byte:02x} ")?;
        }
        writeln!(output, "-1")?;
    }

    writeln!(output)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump_without_memory_changes() {
        let mut registers = Registers::default();
        registers.set_af(0x0800);
        registers.set_bc(0x0800);
        registers.sp = 0xff00;
        registers.pc = 0x8001;
        registers.r = 0x01;
        registers.iff1 = true;
        registers.iff2 = true;
        let image = vec![0x00; 0x100];
        let mut output = Vec::new();

        dump(&mut output, "ld a,b", &registers, 4, &image, &image).unwrap();

        assert_eq!(
            "ld a,b\n\
             0800 0800 0000 0000 0000 0000 0000 0000 0000 0000 ff00 8001\n\
             00 01 1 1 0 0 4\n\
             \n",
            String::from_utf8(output).unwrap()
        );
    }

    #[test]
    fn test_dump_with_memory_runs() {
        let registers = Registers::default();
        let pre = vec![0x00; 0x100];
        let mut post = pre.clone();
        post[0x10] = 0xaa;
        post[0x11] = 0xbb;
        post[0x20] = 0xcc;
        let mut output = Vec::new();

        dump(&mut output, "writes", &registers, 0, &pre, &post).unwrap();

        assert_eq!(
            "writes\n\
             0000 0000 0000 0000 0000 0000 0000 0000 0000 0000 0000 0000\n\
             00 00 0 0 0 0 0\n\
             0010 aa bb -1\n\
             0020 cc -1\n\
             \n",
            String::from_utf8(output).unwrap()
        );
    }

    #[test]
    fn test_halted_flag_and_tstates_close_the_state_line() {
        let mut registers = Registers::default();
        registers.halted = true;
        registers.i = 0x3f;
        registers.im = 2;
        let image = vec![0x00; 0x10];
        let mut output = Vec::new();

        dump(&mut output, "halted", &registers, 1234, &image, &image).unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("3f 00 0 0 2 1 1234\n"));
    }
}
