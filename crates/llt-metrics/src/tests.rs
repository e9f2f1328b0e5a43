//! Tests for counters, rows, and the CSV writers.

#[cfg(test)]
mod counters {
    use llt_core::{Iface, SimTime};

    use crate::NodeCounters;
    use crate::counters::APP_PACKET_THRESHOLD;

    fn secs(s: u64) -> SimTime {
        SimTime::from_secs(s)
    }

    #[test]
    fn size_classifier_splits_app_and_control() {
        let mut c = NodeCounters::new();
        c.on_phy_tx(Iface::W, APP_PACKET_THRESHOLD, 11.0, secs(1));
        c.on_phy_tx(Iface::W, APP_PACKET_THRESHOLD - 1, 11.0, secs(1));
        c.on_phy_rx(Iface::Wd, 1024, 36.0);
        c.on_phy_rx(Iface::Wd, 112, 36.0);

        let row = c.snapshot(secs(2));
        assert_eq!(row.tx_app, 1);
        assert_eq!(row.tx, 1);
        assert_eq!(row.rx_app_wd, 1);
        assert_eq!(row.rx_wd, 1);
    }

    #[test]
    fn window_counters_reset_after_snapshot() {
        let mut c = NodeCounters::new();
        c.on_disc_rx(Iface::W, 112);
        c.on_app_rx(Iface::Wd, 2048, 2, 17, 0.05);

        let row = c.snapshot(secs(1));
        assert_eq!(row.pkt_rx_disc, 1);
        assert_eq!(row.pkt_rx_wd_app, 2);
        assert_eq!(row.seq_wd, 17);
        assert_eq!(row.delay_wd, 0.05);

        let row = c.snapshot(secs(2));
        assert_eq!(row.pkt_rx_disc, 0);
        assert_eq!(row.pkt_rx_wd_app, 0);
        assert_eq!(row.seq_wd, 0);
        assert_eq!(row.delay_wd, 0.0);
    }

    #[test]
    fn task_totals_survive_snapshots() {
        let mut c = NodeCounters::new();
        c.task_assigned();
        c.task_assigned();
        c.task_failed();
        c.snapshot(secs(1));
        let row = c.snapshot(secs(2));
        assert_eq!(row.tasks_assigned, 2);
        assert_eq!(row.tasks_failed, 1);
    }

    #[test]
    fn megabit_conversion() {
        let mut c = NodeCounters::new();
        // 1,000,000 bytes = 8 megabits
        c.on_app_rx(Iface::W, 1_000_000, 977, 1, 0.0);
        let row = c.snapshot(secs(1));
        assert!((row.mbs_app - 8.0).abs() < 1e-9);
    }

    #[test]
    fn used_bandwidth_reads_last_window() {
        let mut c = NodeCounters::new();
        assert_eq!(c.used_bandwidth_mbps(Iface::W), 0.0);

        c.on_app_rx(Iface::W, 500_000, 489, 1, 0.0); // 4 Mbit
        c.on_disc_rx(Iface::W, 125_000); // 1 Mbit
        c.snapshot(secs(1));
        assert!((c.used_bandwidth_mbps(Iface::W) - 5.0).abs() < 1e-9);

        // an empty window zeroes it again
        c.snapshot(secs(2));
        assert_eq!(c.used_bandwidth_mbps(Iface::W), 0.0);
    }

    #[test]
    fn phy_rates_persist_across_windows() {
        let mut c = NodeCounters::new();
        c.on_phy_tx(Iface::W, 112, 11.0, secs(1));
        c.snapshot(secs(1));
        assert_eq!(c.tx_rate_mbps(Iface::W), 11.0);
        let row = c.snapshot(secs(2));
        assert_eq!(row.tx_rate, 11.0);
    }

    #[test]
    fn throughput_uses_first_send_denominator() {
        let mut c = NodeCounters::new();
        c.on_phy_tx(Iface::W, 100, 11.0, secs(2)); // control class, first tx at 2 s
        c.on_disc_rx(Iface::W, 250_000); // 2 Mbit this window
        let row = c.snapshot(secs(4)); // 2 s since first send
        assert!((row.throughput_disc - 1.0).abs() < 1e-9);
    }
}

#[cfg(test)]
mod csv_out {
    use llt_core::{NodeId, SimTime, Vec3};
    use tempfile::TempDir;

    use crate::{MetricsRow, MetricsWriter, MobilityTraceWriter};

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    #[test]
    fn one_file_per_node() {
        let dir = tmp();
        let mut w = MetricsWriter::new(dir.path(), 3, "out.csv").unwrap();
        w.finish().unwrap();
        for i in 0..3 {
            assert!(MetricsWriter::node_path(dir.path(), i, "out.csv").exists());
        }
    }

    #[test]
    fn header_matches_schema() {
        let dir = tmp();
        let mut w = MetricsWriter::new(dir.path(), 1, "out.csv").unwrap();
        w.write_row(NodeId(0), &MetricsRow::default()).unwrap();
        w.finish().unwrap();

        let mut rdr =
            csv::Reader::from_path(MetricsWriter::node_path(dir.path(), 0, "out.csv")).unwrap();
        let headers: Vec<_> = rdr.headers().unwrap().iter().map(str::to_owned).collect();
        assert_eq!(headers.len(), 31);
        assert_eq!(headers[0], "sim_second");
        assert_eq!(headers[3], "mbsDisc");
        assert_eq!(headers[7], "throughputDisc");
        assert_eq!(headers[30], "rx_wd");
    }

    #[test]
    fn rows_roundtrip() {
        let dir = tmp();
        let mut w = MetricsWriter::new(dir.path(), 1, "out.csv").unwrap();
        let row = MetricsRow {
            sim_second: 3.0,
            tasks_assigned: 2,
            mbs_wd_app: 1.5,
            seq: 42,
            ..Default::default()
        };
        w.write_row(NodeId(0), &row).unwrap();
        w.finish().unwrap();

        let mut rdr =
            csv::Reader::from_path(MetricsWriter::node_path(dir.path(), 0, "out.csv")).unwrap();
        let back: MetricsRow = rdr.deserialize().next().unwrap().unwrap();
        assert_eq!(back, row);
    }

    #[test]
    fn trace_records_positions() {
        let dir = tmp();
        let path = dir.path().join("trace.csv");
        let mut t = MobilityTraceWriter::new(&path).unwrap();
        t.record(SimTime::from_secs(1), NodeId(2), Vec3::new(10.0, 20.0, 50.0))
            .unwrap();
        t.finish().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next().unwrap(), "time_s,node,x,y,z");
        assert_eq!(lines.next().unwrap(), "1.000,2,10.00,20.00,50.00");
    }
}
