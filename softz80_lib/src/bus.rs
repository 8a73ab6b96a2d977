/*
 * Bus
 * The engine's window on the outside world: memory and I/O port access.
 * Engines receive a `&mut dyn Bus` on every step, so the wiring is checked
 * by the type system instead of at callback registration time.
 */
pub trait Bus {
    fn read(&mut self, address: u16) -> u8;
    fn write(&mut self, address: u16, data: u8);
    fn io_read(&mut self, port: u16) -> u8;
    fn io_write(&mut self, port: u16, data: u8);
}
