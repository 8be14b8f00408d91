//! End-to-end transfers between two sessions over a simulated datagram
//! link, with and without loss.

use lazulite::{peek_conv, Config, Session};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

const CONV: u32 = 0x5A5A_1234;

type Wire = Rc<RefCell<VecDeque<Vec<u8>>>>;

fn wire() -> Wire {
    Rc::new(RefCell::new(VecDeque::new()))
}

fn sink(wire: Wire) -> impl FnMut(&[u8]) {
    move |datagram: &[u8]| wire.borrow_mut().push_back(datagram.to_vec())
}

/// Moves queued datagrams from one side to the other, dropping each with
/// probability `loss`.
fn shuttle(
    rng: &mut StdRng,
    loss: f64,
    from: &Wire,
    to: &mut Session<impl FnMut(&[u8])>,
) {
    loop {
        let datagram = from.borrow_mut().pop_front();
        let Some(datagram) = datagram else { break };
        if loss > 0.0 && rng.random::<f64>() < loss {
            continue;
        }
        assert_eq!(peek_conv(&datagram), Some(CONV));
        to.input(&datagram).unwrap();
    }
}

fn test_messages(count: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|i| {
            let len = (i * 977) % 4321 + 1;
            (0..len).map(|j| ((i * 31 + j) % 256) as u8).collect()
        })
        .collect()
}

/// Drives both endpoints until every message has arrived or simulated time
/// runs out, returning what was delivered in order.
fn run_transfer(
    a: &mut Session<impl FnMut(&[u8])>,
    b: &mut Session<impl FnMut(&[u8])>,
    a_wire: &Wire,
    b_wire: &Wire,
    rng: &mut StdRng,
    loss: f64,
    expected: usize,
    deadline_ms: u32,
) -> Vec<Vec<u8>> {
    let mut received = Vec::new();
    let mut buf = vec![0u8; 16 * 1024];
    let mut clock = 0u32;

    while received.len() < expected && clock < deadline_ms {
        a.update(clock).unwrap();
        shuttle(rng, loss, a_wire, b);
        b.update(clock).unwrap();
        shuttle(rng, loss, b_wire, a);
        while let Ok(n) = b.recv(&mut buf) {
            received.push(buf[..n].to_vec());
        }
        clock += 10;
    }

    received
}

#[test]
fn bulk_transfer_without_loss() {
    let (a_wire, b_wire) = (wire(), wire());
    let mut a = Session::new(CONV, sink(a_wire.clone())).unwrap();
    let mut b = Session::new(CONV, sink(b_wire.clone())).unwrap();

    let messages = test_messages(32);
    for message in &messages {
        a.send(message).unwrap();
    }

    let mut rng = StdRng::seed_from_u64(1);
    let received = run_transfer(&mut a, &mut b, &a_wire, &b_wire, &mut rng, 0.0, messages.len(), 60_000);

    assert_eq!(received, messages);
    assert_eq!(a.wait_snd(), 0);
    assert!(!a.is_dead_link());
}

#[test]
fn transfer_survives_loss() {
    let (a_wire, b_wire) = (wire(), wire());
    let config = Config {
        fastresend: 2,
        ..Config::default()
    };
    let mut a = Session::with_config(CONV, config.clone(), sink(a_wire.clone())).unwrap();
    let mut b = Session::with_config(CONV, config, sink(b_wire.clone())).unwrap();

    let messages = test_messages(24);
    for message in &messages {
        a.send(message).unwrap();
    }

    // 10% loss in both directions; ARQ has to fill every hole.
    let mut rng = StdRng::seed_from_u64(7);
    let received = run_transfer(&mut a, &mut b, &a_wire, &b_wire, &mut rng, 0.1, messages.len(), 300_000);

    assert_eq!(received, messages);
    assert!(!a.is_dead_link());
}

#[test]
fn transfer_survives_duplication_and_reordering() {
    let (a_wire, b_wire) = (wire(), wire());
    let mut a = Session::new(CONV, sink(a_wire.clone())).unwrap();
    let mut b = Session::new(CONV, sink(b_wire.clone())).unwrap();

    let messages = test_messages(16);
    for message in &messages {
        a.send(message).unwrap();
    }

    let mut rng = StdRng::seed_from_u64(42);
    let mut received = Vec::new();
    let mut buf = vec![0u8; 16 * 1024];
    let mut clock = 0u32;

    while received.len() < messages.len() && clock < 120_000 {
        a.update(clock).unwrap();

        // Deliver this round's datagrams shuffled, and every one twice.
        let mut batch: Vec<Vec<u8>> = a_wire.borrow_mut().drain(..).collect();
        for i in (1..batch.len()).rev() {
            let j = rng.random_range(0..=i);
            batch.swap(i, j);
        }
        for datagram in &batch {
            b.input(datagram).unwrap();
            b.input(datagram).unwrap();
        }

        b.update(clock).unwrap();
        let acks: Vec<Vec<u8>> = b_wire.borrow_mut().drain(..).collect();
        for datagram in &acks {
            a.input(datagram).unwrap();
            a.input(datagram).unwrap();
        }

        while let Ok(n) = b.recv(&mut buf) {
            received.push(buf[..n].to_vec());
        }
        clock += 10;
    }

    // Exactly once, in order, despite the chaos.
    assert_eq!(received, messages);
}

#[test]
fn stream_mode_preserves_byte_order_across_loss() {
    let (a_wire, b_wire) = (wire(), wire());
    let config = Config {
        stream: true,
        ..Config::default()
    };
    let mut a = Session::with_config(CONV, config.clone(), sink(a_wire.clone())).unwrap();
    let mut b = Session::with_config(CONV, config, sink(b_wire.clone())).unwrap();

    // Many small writes; stream mode is free to coalesce them.
    let mut sent = Vec::new();
    for i in 0..200usize {
        let chunk: Vec<u8> = (0..(i % 61 + 1)).map(|j| ((i + j) % 256) as u8).collect();
        a.send(&chunk).unwrap();
        sent.extend_from_slice(&chunk);
    }

    let mut rng = StdRng::seed_from_u64(99);
    let mut stream = Vec::new();
    let mut buf = vec![0u8; 16 * 1024];
    let mut clock = 0u32;
    while stream.len() < sent.len() && clock < 300_000 {
        a.update(clock).unwrap();
        shuttle(&mut rng, 0.05, &a_wire, &mut b);
        b.update(clock).unwrap();
        shuttle(&mut rng, 0.05, &b_wire, &mut a);
        while let Ok(n) = b.recv(&mut buf) {
            stream.extend_from_slice(&buf[..n]);
        }
        clock += 10;
    }

    assert_eq!(stream, sent);
}
