//! The experiment: per-node state, subsystem wiring, and the dispatch loop.
//!
//! One `Experiment` owns everything a run needs — nodes, the two routing
//! tables, the task queue, the radio bus, the event queue, and the output
//! writers.  All mutation happens inside `dispatch`, one event at a time,
//! which is what makes the process-wide tables safe to share without locks.
//!
//! Output errors follow the store-first-surface-later pattern: handlers have
//! nowhere to return a `Result` to, so the first write error is kept and
//! reported when the run finishes.

use std::net::Ipv4Addr;
use std::path::Path;

use llt_alloc::{
    Candidate, IfaceBandwidth, TaskOutcome, TaskQueue, TransferLeg, TransferRequest,
    plan_transfer,
};
use llt_core::{Iface, NodeId, NodeRng, SimConfig, SimRng, SimTime, TaskId, Vec3};
use llt_metrics::{MetricsError, MetricsWriter, MobilityTraceWriter, NodeCounters};
use llt_mobility::{Mobility, Predictor, RegionMap};
use llt_net::{
    DiscoveryHeader, DiscoveryService, ReceiverState, ReplyHeader, RouteTable, handle_discovery,
    handle_reply,
};
use llt_sched::{EventId, EventQueue};
use log::{debug, info, warn};
use rustc_hash::FxHashMap;

use crate::bus::{Frame, Payload, RadioBus};
use crate::error::{SimError, SimResult};
use crate::event::Event;

/// Zero padding appended behind every control header, so discovery frames
/// land well under the app/control size classifier.
const CONTROL_PADDING: usize = 100;

/// Application stream packet size.
const APP_PACKET_BYTES: u32 = 1024;

/// Application streams emit one aggregated frame per slice.
const SLICE: SimTime = SimTime(100);

// ── Per-node state ────────────────────────────────────────────────────────────

struct NodeState {
    mobility: Mobility,
    predictor: Predictor,
    discovery: DiscoveryService,
    rng: NodeRng,
    /// Intrinsic processing speed, GHz, advertised in every REPLY.
    cpu_speed: f64,
    counters: NodeCounters,
    outcomes: Vec<TaskOutcome>,
    /// Handle of the armed discovery broadcast, for stop-time cancellation.
    pending_send: Option<EventId>,
}

/// One active application stream (one allocator leg).
struct AppStream {
    task: TaskId,
    sender: NodeId,
    iface: Iface,
    peer_addr: Ipv4Addr,
    rate_mbps: f64,
    ends_at: SimTime,
    next_seq: u32,
    sent_bytes: u64,
    delivered_bytes: u64,
}

/// End-of-run task totals for one node.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct NodeSummary {
    pub node: NodeId,
    pub tasks_assigned: u32,
    pub tasks_failed: u32,
    pub tasks_succeeded: u32,
}

// ── Experiment ────────────────────────────────────────────────────────────────

/// All state for one simulation run.
pub struct Experiment {
    config: SimConfig,
    region_map: RegionMap,
    nodes: Vec<NodeState>,

    rtable_w: RouteTable,
    rtable_wd: RouteTable,
    addr_to_node: FxHashMap<Ipv4Addr, NodeId>,
    w_to_wd: FxHashMap<Ipv4Addr, Ipv4Addr>,

    queue: EventQueue<Event>,
    bus: RadioBus,
    tasks: TaskQueue,
    streams: Vec<AppStream>,
    /// Round-robin sender counter for the allocator.
    next_target: usize,

    now: SimTime,
    rng: SimRng,

    metrics_out: Option<MetricsWriter>,
    trace_out: Option<MobilityTraceWriter>,
    output_error: Option<MetricsError>,
}

impl Experiment {
    /// Build a run: place nodes, bind addresses, open output files, and arm
    /// the initial timers.
    ///
    /// `output_dir = None` runs without CSV output (tests).
    pub fn new(config: SimConfig, output_dir: Option<&Path>) -> SimResult<Self> {
        config.validate()?;

        let region_map = RegionMap::default();
        let mut rng = SimRng::new(config.seed);
        let bus = RadioBus::new(config.radio_w, config.radio_wd, rng.child(1));

        let mut addr_to_node = FxHashMap::default();
        let mut w_to_wd = FxHashMap::default();
        let mut nodes = Vec::with_capacity(config.nodes as usize);
        for i in 0..config.nodes {
            let id = NodeId(i);
            let mut node_rng = NodeRng::new(config.seed, id);
            let pos = Vec3::new(
                node_rng.gen_range(0.0..500.0),
                node_rng.gen_range(0.0..450.0),
                node_rng.gen_range(0.0..100.0),
            );
            let cpu_speed = node_rng.gen_range(1.0..2.4);

            for iface in Iface::BOTH {
                let addr = iface.addr(id);
                if addr_to_node.insert(addr, id).is_some() {
                    return Err(SimError::AddrInUse(addr));
                }
            }
            w_to_wd.insert(Iface::W.addr(id), Iface::Wd.addr(id));

            let mut discovery = DiscoveryService::new(config.service_period);
            discovery.start();

            nodes.push(NodeState {
                mobility: Mobility::new(pos, &region_map, SimTime::ZERO),
                predictor: Predictor::new(),
                discovery,
                rng: node_rng,
                cpu_speed,
                counters: NodeCounters::new(),
                outcomes: Vec::new(),
                pending_send: None,
            });
        }

        let (metrics_out, trace_out) = match output_dir {
            Some(dir) => {
                let metrics =
                    MetricsWriter::new(dir, config.nodes as usize, &config.csv_file_name)?;
                let trace = config
                    .trace_mobility
                    .then(|| MobilityTraceWriter::new(&dir.join("mobility-trace.csv")))
                    .transpose()?;
                (Some(metrics), trace)
            }
            None => (None, None),
        };

        let mut exp = Self {
            config,
            region_map,
            nodes,
            rtable_w: RouteTable::new(),
            rtable_wd: RouteTable::new(),
            addr_to_node,
            w_to_wd,
            queue: EventQueue::new(),
            bus,
            tasks: TaskQueue::seeded(),
            streams: Vec::new(),
            next_target: 0,
            now: SimTime::ZERO,
            rng,
            metrics_out,
            trace_out,
            output_error: None,
        };
        exp.arm_initial_timers();
        Ok(exp)
    }

    fn arm_initial_timers(&mut self) {
        for i in 0..self.nodes.len() {
            let id = NodeId(i as u16);
            self.queue.schedule_at(Mobility::first_pause(), Event::PauseEnd(id));
            self.queue.schedule_at(SimTime::from_secs(1), Event::DwellPoll(id));
            let delay = {
                let node = &mut self.nodes[i];
                node.discovery.next_delay(&mut node.rng)
            };
            let ev = self.queue.schedule_at(delay, Event::DiscoverySend(id));
            self.nodes[i].pending_send = Some(ev);
        }
        self.queue
            .schedule_at(self.config.metrics_interval, Event::MetricsTick);
        self.queue.schedule_at(SimTime::from_secs(1), Event::InactiveSweep);
        self.queue
            .schedule_at(self.config.allocator_start, Event::AllocatorRun);
    }

    // ── Run loop ──────────────────────────────────────────────────────────

    /// Run to `config.total_time`, flush output, and surface any stored
    /// write error.
    pub fn run(&mut self) -> SimResult<()> {
        let end = self.config.total_time;
        self.run_until(end);
        self.finish()
    }

    /// Fire every event scheduled at or before `end`.
    pub fn run_until(&mut self, end: SimTime) {
        loop {
            match self.queue.next_time() {
                Some(t) if t <= end => {
                    if let Some(firing) = self.queue.pop() {
                        self.now = firing.time;
                        self.dispatch(firing.payload);
                    }
                }
                _ => break,
            }
        }
        self.now = end;
    }

    /// Flush writers and report the first stored output error, if any.
    pub fn finish(&mut self) -> SimResult<()> {
        if let Some(w) = &mut self.metrics_out {
            w.finish()?;
        }
        if let Some(t) = &mut self.trace_out {
            t.finish()?;
        }
        match self.output_error.take() {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    fn store_output_err(&mut self, result: Result<(), MetricsError>) {
        if let Err(e) = result {
            if self.output_error.is_none() {
                self.output_error = Some(e);
            }
        }
    }

    // ── Dispatch ──────────────────────────────────────────────────────────

    fn dispatch(&mut self, event: Event) {
        match event {
            Event::PauseEnd(node) => self.on_pause_end(node),
            Event::Arrival(node) => self.on_arrival(node),
            Event::DwellPoll(node) => self.on_dwell_poll(node),
            Event::DiscoverySend(node) => self.on_discovery_send(node),
            Event::Deliver { to, frame } => self.on_deliver(to, frame),
            Event::AllocatorRun => self.on_allocator_run(),
            Event::StreamSlice(stream) => self.on_stream_slice(stream),
            Event::TransferCheck { task } => self.on_transfer_check(task),
            Event::MetricsTick => self.on_metrics_tick(),
            Event::InactiveSweep => self.on_inactive_sweep(),
        }
    }

    // ── Mobility ──────────────────────────────────────────────────────────

    fn on_pause_end(&mut self, id: NodeId) {
        let now = self.now;
        let leg = {
            let node = &mut self.nodes[id.index()];
            let NodeState { mobility, predictor, rng, .. } = node;
            mobility.begin_walk(now, &self.region_map, predictor, rng)
        };
        self.record_trace(id);
        self.queue.schedule_at(now + leg.travel, Event::Arrival(id));
    }

    fn on_arrival(&mut self, id: NodeId) {
        let now = self.now;
        let pause = {
            let node = &mut self.nodes[id.index()];
            let predicted = node.predictor.predicted_interval();
            node.mobility.arrive(now, &self.region_map, predicted)
        };
        self.record_trace(id);
        self.queue.schedule_at(now + pause, Event::PauseEnd(id));
    }

    fn on_dwell_poll(&mut self, id: NodeId) {
        let now = self.now;
        self.nodes[id.index()].mobility.poll_dwell(now, &self.region_map);
        self.queue
            .schedule_at(now + SimTime::from_secs(1), Event::DwellPoll(id));
    }

    fn record_trace(&mut self, id: NodeId) {
        if self.trace_out.is_some() {
            let pos = self.nodes[id.index()].mobility.position(self.now);
            let now = self.now;
            if let Some(t) = &mut self.trace_out {
                let res = t.record(now, id, pos);
                self.store_output_err(res);
            }
        }
    }

    // ── Discovery plane ───────────────────────────────────────────────────

    fn on_discovery_send(&mut self, id: NodeId) {
        if !self.nodes[id.index()].discovery.is_running() {
            return;
        }
        for iface in Iface::BOTH {
            let predicted = self.nodes[id.index()].predictor.predicted_location();
            let header = DiscoveryService::announcement(iface.addr(id), predicted);
            let mut bytes = header.serialize().to_vec();
            bytes.resize(bytes.len() + CONTROL_PADDING, 0);
            self.send_control(id, iface, None, bytes);
        }

        let now = self.now;
        let delay = {
            let node = &mut self.nodes[id.index()];
            node.discovery.next_delay(&mut node.rng)
        };
        let ev = self.queue.schedule_at(now + delay, Event::DiscoverySend(id));
        self.nodes[id.index()].pending_send = Some(ev);
    }

    /// Stop one node's discovery application: cancel the armed broadcast
    /// and close both sockets.
    pub fn stop_discovery(&mut self, id: NodeId) {
        let node = &mut self.nodes[id.index()];
        node.discovery.stop();
        if let Some(ev) = node.pending_send.take() {
            self.queue.cancel(ev);
        }
    }

    /// Encode-side of the control plane: PHY-tap the sender, pick the
    /// recipients, and schedule the deliveries.
    fn send_control(&mut self, from: NodeId, iface: Iface, dst: Option<Ipv4Addr>, bytes: Vec<u8>) {
        let size = bytes.len();
        let rate = self.bus.config(iface).rate_mbps;
        let now = self.now;
        self.nodes[from.index()]
            .counters
            .on_phy_tx(iface, size, rate, now);

        let positions = self.positions();
        let deliveries = match dst {
            None => self.bus.broadcast(iface, from, size, &positions),
            Some(addr) => match self.addr_to_node.get(&addr) {
                Some(&to) => self
                    .bus
                    .unicast(iface, from, to, size, &positions)
                    .into_iter()
                    .collect(),
                None => Vec::new(),
            },
        };

        let frame = Frame {
            iface,
            src: iface.addr(from),
            dst,
            port: iface.discovery_port(),
            payload: Payload::Control(bytes),
        };
        for d in deliveries {
            self.queue.schedule_at(
                now + d.delay,
                Event::Deliver { to: d.to, frame: frame.clone() },
            );
        }
    }

    fn on_deliver(&mut self, to: NodeId, frame: Frame) {
        let iface = frame.iface;
        let size = frame.size_bytes();
        let rate = self.bus.config(iface).rate_mbps;

        match frame.payload {
            Payload::Control(bytes) => {
                self.nodes[to.index()].counters.on_phy_rx(iface, size, rate);
                // Broadcast control frames are DISCOVERY; unicast ones are
                // REPLY — mirroring the broadcast/bound-address split of the
                // two listening sockets.
                if frame.dst.is_none() {
                    self.on_discovery_frame(to, iface, size, &bytes);
                } else {
                    self.on_reply_frame(to, iface, size, &bytes);
                }
            }
            Payload::Data { stream, seq, sent_at, bytes, packets } => {
                let delay = self.now.since(sent_at).as_secs_f64();
                let counters = &mut self.nodes[to.index()].counters;
                counters.on_phy_rx_burst(iface, APP_PACKET_BYTES as usize, packets as u64, rate);
                counters.on_app_rx(iface, bytes as usize, packets, seq, delay);
                self.streams[stream].delivered_bytes += bytes as u64;
            }
        }
    }

    fn receiver_state(&self, id: NodeId, iface: Iface) -> ReceiverState {
        let node = &self.nodes[id.index()];
        ReceiverState {
            my_addr: iface.addr(id),
            my_location: node.mobility.position(self.now),
            predicted_location: node.predictor.predicted_location(),
            predicted_interval: node.predictor.predicted_interval(),
            cpu_speed: node.cpu_speed,
        }
    }

    fn peer_position(&self, addr: Ipv4Addr) -> Option<(NodeId, Vec3)> {
        let node = *self.addr_to_node.get(&addr)?;
        Some((node, self.nodes[node.index()].mobility.position(self.now)))
    }

    fn on_discovery_frame(&mut self, to: NodeId, iface: Iface, size: usize, bytes: &[u8]) {
        let header = match DiscoveryHeader::deserialize(bytes) {
            Ok(h) => h,
            Err(e) => {
                warn!("node {to}: dropping discovery frame: {e}");
                self.nodes[to.index()].counters.on_malformed();
                return;
            }
        };
        let Some((_, peer_pos)) = self.peer_position(header.src) else {
            return;
        };
        self.nodes[to.index()].counters.on_disc_rx(iface, size);

        let rx = self.receiver_state(to, iface);
        let table = match iface {
            Iface::W => &mut self.rtable_w,
            Iface::Wd => &mut self.rtable_wd,
        };
        let reply = handle_discovery(table, &header, &rx, peer_pos, self.now);

        if let Some(reply) = reply {
            let mut bytes = reply.serialize().to_vec();
            bytes.resize(bytes.len() + CONTROL_PADDING, 0);
            self.send_control(to, iface, Some(reply.dst), bytes);
        }
    }

    fn on_reply_frame(&mut self, to: NodeId, iface: Iface, size: usize, bytes: &[u8]) {
        let header = match ReplyHeader::deserialize(bytes) {
            Ok(h) => h,
            Err(e) => {
                warn!("node {to}: dropping reply frame: {e}");
                self.nodes[to.index()].counters.on_malformed();
                return;
            }
        };
        let Some((_, peer_pos)) = self.peer_position(header.src) else {
            return;
        };
        self.nodes[to.index()].counters.on_disc_rx(iface, size);

        let rx = self.receiver_state(to, iface);
        let table = match iface {
            Iface::W => &mut self.rtable_w,
            Iface::Wd => &mut self.rtable_wd,
        };
        handle_reply(table, &header, &rx, peer_pos, self.now);
    }

    // ── Allocation ────────────────────────────────────────────────────────

    fn on_allocator_run(&mut self) {
        let Some(task) = self.tasks.peek().copied() else {
            return;
        };
        let target = NodeId((self.next_target % self.nodes.len()) as u16);
        self.next_target += 1;

        let counters = &self.nodes[target.index()].counters;
        let bw = IfaceBandwidth {
            available_w_mbps: counters.tx_rate_mbps(Iface::W)
                - counters.used_bandwidth_mbps(Iface::W),
            available_wd_mbps: counters.tx_rate_mbps(Iface::Wd)
                - counters.used_bandwidth_mbps(Iface::Wd),
        };

        let my_w = Iface::W.addr(target);
        let my_wd = Iface::Wd.addr(target);
        let candidates: Vec<Candidate> = self
            .rtable_w
            .routes_for(my_w)
            .filter_map(|e| {
                let peer_wd = *self.w_to_wd.get(&e.peer_addr)?;
                let wd = self.rtable_wd.lookup(peer_wd, my_wd)?;
                Some(Candidate {
                    peer_w: e.peer_addr,
                    peer_wd,
                    llt_w_secs: e.link_lifetime,
                    llt_wd_secs: wd.link_lifetime,
                    cpu_speed: e.peer_cpu_speed,
                })
            })
            .collect();

        self.nodes[target.index()].counters.task_assigned();
        let req = TransferRequest { size_mb: task.size_mb, deadline_secs: task.deadline_secs };
        match plan_transfer(req, bw, &candidates, self.config.alloc) {
            Ok(plan) => {
                self.tasks.pop();
                let start = self.now;
                let complete = start + SimTime::from_secs_f64(plan.total_duration_secs());
                info!(
                    "task {} assigned to node {target}: {:.0}MB primary on {}, done by {complete}",
                    task.id, plan.primary.data_mb, plan.primary.iface
                );
                self.nodes[target.index()]
                    .outcomes
                    .push(TaskOutcome::succeeded(task.id, start, start, complete));
                self.start_leg(target, task.id, plan.primary);
                if let Some(rem) = plan.remainder {
                    self.start_leg(target, task.id, rem);
                }
                self.queue.schedule_at(
                    start + SimTime::from_secs_f64(task.deadline_secs),
                    Event::TransferCheck { task: task.id },
                );
            }
            Err(e) => {
                debug!("task {} failed on node {target}: {e}", task.id);
                self.tasks.pop();
                let node = &mut self.nodes[target.index()];
                node.counters.task_failed();
                node.outcomes.push(TaskOutcome::failed(task.id, self.now));
            }
        }

        if !self.tasks.is_empty() {
            let delay: u64 = self.rng.gen_range(0..=10);
            self.queue
                .schedule_at(self.now + SimTime::from_secs(delay), Event::AllocatorRun);
        }
    }

    fn start_leg(&mut self, sender: NodeId, task: TaskId, leg: TransferLeg) {
        let stream = self.streams.len();
        self.streams.push(AppStream {
            task,
            sender,
            iface: leg.iface,
            peer_addr: leg.peer,
            rate_mbps: leg.rate_mbps,
            ends_at: self.now + SimTime::from_secs_f64(leg.duration_secs),
            next_seq: 0,
            sent_bytes: 0,
            delivered_bytes: 0,
        });
        self.queue.schedule_at(self.now, Event::StreamSlice(stream));
    }

    fn on_stream_slice(&mut self, idx: usize) {
        let now = self.now;
        let (sender, iface, peer_addr, rate_mbps, ends_at) = {
            let s = &self.streams[idx];
            (s.sender, s.iface, s.peer_addr, s.rate_mbps, s.ends_at)
        };
        if now >= ends_at {
            return;
        }

        let window = SLICE.min(ends_at - now);
        let secs = window.as_secs_f64();
        let packets = ((rate_mbps * 1_000_000.0 / 8.0 * secs) / APP_PACKET_BYTES as f64)
            .round()
            .max(1.0) as u32;
        let bytes = packets * APP_PACKET_BYTES;

        let seq = {
            let s = &mut self.streams[idx];
            s.next_seq += packets;
            s.sent_bytes += bytes as u64;
            s.next_seq
        };

        let phy_rate = self.bus.config(iface).rate_mbps;
        self.nodes[sender.index()].counters.on_phy_tx_burst(
            iface,
            APP_PACKET_BYTES as usize,
            packets as u64,
            phy_rate,
            now,
        );

        if let Some(&to) = self.addr_to_node.get(&peer_addr) {
            let positions = self.positions();
            if let Some(d) = self.bus.unicast(iface, sender, to, bytes as usize, &positions) {
                let frame = Frame {
                    iface,
                    src: iface.addr(sender),
                    dst: Some(peer_addr),
                    port: iface.app_port(),
                    payload: Payload::Data { stream: idx, seq, sent_at: now, bytes, packets },
                };
                self.queue
                    .schedule_at(now + d.delay, Event::Deliver { to, frame });
            }
        }

        let next = now + window;
        if next < ends_at {
            self.queue.schedule_at(next, Event::StreamSlice(idx));
        }
    }

    fn on_transfer_check(&mut self, task: TaskId) {
        let (sent, delivered): (u64, u64) = self
            .streams
            .iter()
            .filter(|s| s.task == task)
            .fold((0, 0), |(s, d), st| (s + st.sent_bytes, d + st.delivered_bytes));
        debug!(
            "task {task} at deadline: {sent} bytes sent, {delivered} delivered ({:.0}%)",
            if sent > 0 { delivered as f64 / sent as f64 * 100.0 } else { 0.0 }
        );
    }

    // ── Metrics & sweeps ──────────────────────────────────────────────────

    fn on_metrics_tick(&mut self) {
        let now = self.now;
        for i in 0..self.nodes.len() {
            let row = self.nodes[i].counters.snapshot(now);
            if let Some(w) = &mut self.metrics_out {
                let res = w.write_row(NodeId(i as u16), &row);
                self.store_output_err(res);
            }
        }
        self.queue
            .schedule_at(now + self.config.metrics_interval, Event::MetricsTick);
    }

    fn on_inactive_sweep(&mut self) {
        self.sweep_inactive();
        self.queue
            .schedule_at(self.now + SimTime::from_secs(1), Event::InactiveSweep);
    }

    /// Log every routing entry that has gone quiet; entries stay in the
    /// table.  Returns how many were reported.
    pub fn sweep_inactive(&self) -> usize {
        let threshold = self.config.inactive_after;
        let mut reported = 0;
        for (iface, table) in [(Iface::W, &self.rtable_w), (Iface::Wd, &self.rtable_wd)] {
            for e in table.inactive_at(self.now, threshold) {
                debug!(
                    "{iface} route {} -> {} inactive: last packet {} (connected {}, llt {}s)",
                    e.my_addr, e.peer_addr, e.time_last_pkt, e.time_connected, e.link_lifetime
                );
                reported += 1;
            }
        }
        reported
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    fn positions(&self) -> Vec<Vec3> {
        self.nodes
            .iter()
            .map(|n| n.mobility.position(self.now))
            .collect()
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn route_table(&self, iface: Iface) -> &RouteTable {
        match iface {
            Iface::W => &self.rtable_w,
            Iface::Wd => &self.rtable_wd,
        }
    }

    pub fn counters(&self, node: NodeId) -> &NodeCounters {
        &self.nodes[node.index()].counters
    }

    pub fn outcomes(&self, node: NodeId) -> &[TaskOutcome] {
        &self.nodes[node.index()].outcomes
    }

    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    pub fn node_position(&self, node: NodeId) -> Vec3 {
        self.nodes[node.index()].mobility.position(self.now)
    }

    /// Total application bytes handed to the bus and delivered, across all
    /// streams so far.
    pub fn transferred_bytes(&self) -> (u64, u64) {
        self.streams
            .iter()
            .fold((0, 0), |(s, d), st| (s + st.sent_bytes, d + st.delivered_bytes))
    }

    /// End-of-run task totals, one entry per node.
    pub fn summary(&self) -> Vec<NodeSummary> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| NodeSummary {
                node: NodeId(i as u16),
                tasks_assigned: n.counters.tasks_assigned(),
                tasks_failed: n.counters.tasks_failed(),
                tasks_succeeded: n.outcomes.iter().filter(|o| o.success).count() as u32,
            })
            .collect()
    }
}
