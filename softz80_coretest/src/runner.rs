use std::{
    io::{BufRead, Write},
    time::Instant,
};

use anyhow::Context;
use softz80_lib::{Bus, Cpu, Memory};
use tracing::{debug, info, trace};

use crate::{dumper, parser::TestReader, test_case::TestCase, AppResult};

/*
 * CoretestBus
 * Memory access resolves against the 64KiB image; the I/O ports carry no
 * peripherals, only diagnostic taps: a port read answers with the high byte
 * of the port address. Port traffic is logged at debug level, memory
 * traffic at trace level.
 */
pub struct CoretestBus<'a> {
    memory: &'a mut Memory,
}

impl<'a> CoretestBus<'a> {
    pub fn new(memory: &'a mut Memory) -> Self {
        Self { memory }
    }
}

impl Bus for CoretestBus<'_> {
    fn read(&mut self, address: u16) -> u8 {
        let data = self.memory.read(address);
        trace!("MR {address:04x} {data:02x}");

        data
    }

    fn write(&mut self, address: u16, data: u8) {
        trace!("MW {address:04x} {data:02x}");
        self.memory.write(address, data);
    }

    fn io_read(&mut self, port: u16) -> u8 {
        let data = (port >> 8) as u8;
        debug!("PR {port:04x} {data:02x}");

        data
    }

    fn io_write(&mut self, port: u16, data: u8) {
        debug!("PW {port:04x} {data:02x}");
    }
}

/*
 * Coretest
 * Owns the engine and the memory image and sequences one whole batch:
 * parse a vector, load it, run the engine to the target t-state count,
 * dump the resulting state, repeat until the input is exhausted. Every
 * test starts from a fully reset engine and a canary-filled image, so no
 * test can observe a predecessor's residue.
 */
pub struct Coretest<C>
where
    C: Cpu,
{
    cpu: C,
    memory: Memory,
}

impl<C> Coretest<C>
where
    C: Cpu,
{
    pub fn new(cpu: C) -> Self {
        Self {
            cpu,
            memory: Memory::default(),
        }
    }

    /// Reset the engine and the memory image, load the vector's registers
    /// and memory patches, and return the pre-execution memory snapshot.
    pub fn apply(&mut self, test: &TestCase) -> AppResult<Memory> {
        self.cpu.reset();
        self.memory.fill_canary();
        self.cpu.set_registers(&test.registers);

        for patch in &test.patches {
            self.memory
                .load(patch.address, &patch.bytes)
                .with_context(|| format!("test {}: loading memory patch", test.name))?;
        }

        Ok(self.memory.clone())
    }

    /// Single-step the engine until its cumulative t-state counter is no
    /// longer below the target. No instruction cap and no timeout: an
    /// engine that stops advancing its counter spins here forever, which
    /// is the documented contract of the vector format.
    pub fn run_to_target(&mut self, target: u64) -> AppResult<()> {
        while self.cpu.tstates() < target {
            let mut bus = CoretestBus::new(&mut self.memory);
            self.cpu.step(&mut bus)?;
        }

        Ok(())
    }

    fn run_one(&mut self, test: &TestCase, output: &mut impl Write) -> AppResult<()> {
        let pre = self.apply(test)?;

        info!(
            "Running test {}, waiting for tstates={}",
            test.name, test.target_tstates
        );
        let started = Instant::now();
        self.run_to_target(test.target_tstates)?;
        info!(
            "Test {} ran in {}ms",
            test.name,
            started.elapsed().as_millis()
        );

        let registers = self.cpu.registers();
        debug!("final state {registers}");

        dumper::dump(
            output,
            &test.name,
            &registers,
            self.cpu.tstates(),
            pre.as_slice(),
            self.memory.as_slice(),
        )
    }

    /// Run every test in the input stream, writing one output block per
    /// test. The first malformed record or engine fault aborts the whole
    /// batch. Returns the number of tests run.
    pub fn run(&mut self, input: impl BufRead, mut output: impl Write) -> AppResult<usize> {
        let mut reader = TestReader::new(input);
        let started = Instant::now();
        let mut count: usize = 0;

        while let Some(test) = reader.next_test()? {
            info!("Loading test {}", test.name);
            self.run_one(&test, &mut output)?;
            count += 1;
        }

        let elapsed = started.elapsed().as_millis();
        if count > 0 {
            info!(
                "Ran {count} tests in {elapsed}ms (avg. {}ms)",
                elapsed / count as u128
            );
        }

        Ok(count)
    }
}
