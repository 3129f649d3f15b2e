//! End-to-end tests over loopback TCP.
//!
//! The servers run on their own threads; ticks are driven manually through
//! [`EmulatorCore::step`] so the motion is deterministic.

use huber_common::config::EmulatorConfig;
use huber_emulator::core::{EmulatorContext, EmulatorCore, lock_context};
use huber_emulator::device::MotionState;
use huber_emulator::server::{BackdoorServer, StreamServer};
use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::atomic::Ordering;
use std::thread::{self, JoinHandle};
use std::time::Duration;

struct Harness {
    core: EmulatorCore,
    stream_addr: SocketAddr,
    backdoor_addr: SocketAddr,
    servers: Vec<JoinHandle<std::io::Result<()>>>,
}

impl Harness {
    fn start() -> Self {
        let context = EmulatorContext::from_config(&EmulatorConfig::default()).into_shared();
        let core = EmulatorCore::new(context, Duration::from_millis(10));

        let stream = StreamServer::bind("127.0.0.1:0", core.context(), core.running_flag()).unwrap();
        let backdoor =
            BackdoorServer::bind("127.0.0.1:0", core.context(), core.running_flag()).unwrap();
        let stream_addr = stream.local_addr().unwrap();
        let backdoor_addr = backdoor.local_addr().unwrap();

        let servers = vec![
            thread::spawn(move || stream.serve()),
            thread::spawn(move || backdoor.serve()),
        ];

        Self {
            core,
            stream_addr,
            backdoor_addr,
            servers,
        }
    }

    fn tick_until_idle(&mut self, max_ticks: usize) {
        for _ in 0..max_ticks {
            self.core.step(1.0);
            if lock_context(&self.core.context()).device.state() == MotionState::Idle {
                return;
            }
        }
        panic!("axis still moving after {max_ticks} ticks");
    }

    fn stop(self) {
        self.core.running_flag().store(false, Ordering::SeqCst);
        for server in self.servers {
            server.join().unwrap().unwrap();
        }
    }
}

struct Client {
    writer: TcpStream,
    reader: BufReader<TcpStream>,
}

impl Client {
    fn connect(addr: SocketAddr) -> Self {
        let writer = TcpStream::connect(addr).unwrap();
        writer.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        let reader = BufReader::new(writer.try_clone().unwrap());
        Self { writer, reader }
    }

    fn send(&mut self, bytes: &str) {
        self.writer.write_all(bytes.as_bytes()).unwrap();
    }

    fn read_reply(&mut self) -> String {
        let mut line = String::new();
        self.reader.read_line(&mut line).unwrap();
        line
    }

    /// Send a query and return its raw reply, including the terminator.
    fn query(&mut self, command: &str) -> String {
        self.send(&format!("{command}\r"));
        self.read_reply()
    }
}

#[test]
fn test_goto_reaches_target() {
    let mut harness = Harness::start();
    let mut client = Client::connect(harness.stream_addr);

    client.send("goto1:1000\r");
    // The reply proves the goto ahead of it was applied.
    assert_eq!(client.query("?p1"), "1:0.0\r\n");
    assert_eq!(client.query("?s1"), "1:1153\r\n");

    harness.core.step(1.0);
    assert_eq!(client.query("?s1"), "1:1024\r\n");

    harness.tick_until_idle(1000);

    let status: u32 = client
        .query("?s1")
        .trim_end()
        .strip_prefix("1:")
        .unwrap()
        .parse()
        .unwrap();
    assert_eq!(status & 1, 1);
    assert_eq!(status & (1 << 7), 1 << 7);
    assert_eq!(client.query("?p1"), "1:1000.0\r\n");
    assert_eq!(client.query("?e1"), "1:1000.0\r\n");

    harness.stop();
}

#[test]
fn test_fast_move_uses_high_speed() {
    let mut harness = Harness::start();
    let mut client = Client::connect(harness.stream_addr);

    client.send("ffast1:10\rfast1+\r");
    client.query("?p1");
    harness.core.step(0.5);

    {
        let context = harness.core.context();
        let context = lock_context(&context);
        assert_eq!(context.device.state(), MotionState::HighSpeedMoving);
        assert_eq!(context.device.axis().current_speed, 10.0);
    }
    assert_eq!(client.query("?p1"), "1:5.0\r\n");

    client.send("q1\r");
    client.query("?p1");
    harness.core.step(0.5);
    assert_eq!(client.query("?s1"), "1:1153\r\n");

    harness.stop();
}

#[test]
fn test_bad_lines_keep_connection_open() {
    let harness = Harness::start();
    let mut client = Client::connect(harness.stream_addr);

    client.send("hello\r");
    client.send("goto1:abc\r");
    client.send(&"x".repeat(300));
    client.send("\r");
    // CRLF terminated clients still work.
    client.send("?p7\r\n");
    assert_eq!(client.read_reply(), "7:0.0\r\n");

    harness.stop();
}

#[test]
fn test_homing_over_the_wire() {
    let mut harness = Harness::start();
    let mut client = Client::connect(harness.stream_addr);

    client.send("pos1:3\reref1-\r");
    client.query("?p1");
    harness.tick_until_idle(100);

    assert_eq!(client.query("?p1"), "1:0.0\r\n");
    // Referenced adds bit1 to the idle status word.
    assert_eq!(client.query("?s1"), "1:1155\r\n");

    harness.stop();
}

#[test]
fn test_driver_homing_sequence_adopts_reference_point() {
    let mut harness = Harness::start();
    let mut backdoor = Client::connect(harness.backdoor_addr);
    let mut client = Client::connect(harness.stream_addr);

    backdoor.send("{\"op\":\"set\",\"property\":\"positive_limit\",\"value\":100}\n");
    assert_eq!(backdoor.read_reply(), "{\"ok\":true}\n");
    backdoor.send("{\"op\":\"set\",\"property\":\"reference_point\",\"value\":-42.5}\n");
    assert_eq!(backdoor.read_reply(), "{\"ok\":true}\n");

    // Drive to the limit switch first.
    client.send("ffast1:50\rfast1+\r");
    client.query("?p1");
    harness.tick_until_idle(100);
    assert_eq!(client.query("?p1"), "1:100.0\r\n");
    let word: u32 = client.query("?s1").trim_end()[2..].parse().unwrap();
    assert_eq!(word & (1 << 3), 1 << 3);

    // Seek the reference mark in the opposite direction.
    client.send("eref1-\r");
    client.query("?p1");
    harness.core.step(1.0);
    assert_eq!(client.query("?s1"), "1:1024\r\n");
    harness.tick_until_idle(100);

    assert_eq!(client.query("?p1"), "1:-42.5\r\n");
    assert_eq!(client.query("?s1"), "1:1155\r\n");
    backdoor.send("{\"op\":\"get\",\"property\":\"referenced\"}\n");
    assert_eq!(backdoor.read_reply(), "{\"ok\":true,\"value\":true}\n");

    // The driver then zeroes the coordinate.
    client.send("pos1:0.000000\r");
    assert_eq!(client.query("?p1"), "1:0.0\r\n");
    harness.core.step(1.0);
    assert_eq!(client.query("?p1"), "1:0.0\r\n");
    assert_eq!(client.query("?s1"), "1:1155\r\n");

    harness.stop();
}

#[test]
fn test_backdoor_json() {
    let mut harness = Harness::start();
    let mut backdoor = Client::connect(harness.backdoor_addr);
    let mut client = Client::connect(harness.stream_addr);

    backdoor.send("{\"op\":\"set\",\"property\":\"positive_limit\",\"value\":100}\n");
    assert_eq!(backdoor.read_reply(), "{\"ok\":true}\n");
    backdoor.send("{\"op\":\"get\",\"property\":\"positive_limit\"}\n");
    assert_eq!(backdoor.read_reply(), "{\"ok\":true,\"value\":100.0}\n");

    client.send("goto1:200\r");
    client.query("?p1");
    harness.tick_until_idle(1000);

    backdoor.send("{\"op\":\"get\",\"property\":\"positive_limit_tripped\"}\n");
    assert_eq!(backdoor.read_reply(), "{\"ok\":true,\"value\":true}\n");
    // The limit stops the axis, status shows bit3.
    let status = client.query("?s1");
    let word: u32 = status.trim_end()[2..].parse().unwrap();
    assert_eq!(word & (1 << 3), 1 << 3);

    backdoor.send("{\"op\":\"get\",\"property\":\"state\"}\n");
    assert_eq!(backdoor.read_reply(), "{\"ok\":true,\"value\":\"idle\"}\n");

    backdoor.send("{\"op\":\"set\",\"property\":\"state\",\"value\":\"moving\"}\n");
    let reply = backdoor.read_reply();
    assert!(reply.starts_with("{\"ok\":false,\"error\":"), "{reply}");

    backdoor.send("{\"op\":\"list\"}\n");
    let reply: serde_json::Value = serde_json::from_str(&backdoor.read_reply()).unwrap();
    assert_eq!(reply["ok"], true);
    assert!(
        reply["value"]
            .as_array()
            .unwrap()
            .iter()
            .any(|name| name == "simulation.paused")
    );

    harness.stop();
}
