mod util;

use sliding_mesh::io::{partition_path, read_partition_for};
use sliding_mesh::prelude::*;
use std::fs;
use util::*;

#[test]
fn partitions_round_trip_through_json() {
    let dir = scratch_dir("round-trip");
    let ring = striped_ring(RingSpec::default(), 2);
    for rank in 0..2 {
        let path = write_partition(&dir, "rotor", &ring.partition(rank)).unwrap();
        assert_eq!(path, partition_path(&dir, "rotor", rank));
    }
    for rank in 0..2 {
        let back = read_partition(&dir, "rotor", rank).unwrap();
        assert_eq!(back, ring.partition(rank));
        assert_eq!(back.version, sliding_mesh::io::PARTITION_FORMAT_VERSION);
    }
    // Two-rank artifacts do not fit a serial run.
    assert!(matches!(
        read_partition_for(&dir, "rotor", &NoComm),
        Err(SlidingMeshError::MalformedPartition(_))
    ));
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn driver_opens_from_config() {
    let dir = scratch_dir("open");
    let ring = serial_ring(RingSpec::default());
    write_partition(&dir, "part", &ring.partition(0)).unwrap();

    let cfg = SlidingConfig::from_json_str(&format!(
        r#"{{ "partition_dir": {:?}, "face_quadrature": "gauss3",
             "rotation": {{ "angular_velocity": 2.0, "time_step": 0.01 }} }}"#,
        dir.to_str().unwrap()
    ))
    .unwrap();
    let mut driver = SlidingInterface::open(&cfg, NoComm).unwrap();
    assert_eq!(driver.quadrature().len(), 9);
    let stats = driver
        .advance(
            &ring.solution(0),
            &ring.velocity(0, 2.0, 0.0),
            &ring.displacement(0, 0.0),
        )
        .unwrap();
    assert_eq!(stats.points, 8 * 9);

    let too_fast = SlidingConfig {
        rotation: Some(RotationConfig {
            angular_velocity: 2.0,
            time_step: 1.0,
        }),
        ..cfg
    };
    assert!(matches!(
        SlidingInterface::open(&too_fast, NoComm),
        Err(SlidingMeshError::RotationStepTooLarge { .. })
    ));
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn malformed_artifacts_are_rejected() {
    let dir = scratch_dir("malformed");
    let ring = serial_ring(RingSpec::default());

    fs::write(partition_path(&dir, "bad", 0), b"{ not json").unwrap();
    assert!(matches!(
        read_partition(&dir, "bad", 0),
        Err(SlidingMeshError::MalformedPartition(_))
    ));

    let mut short = ring.partition(0);
    short.nodes[0].rotated.loc_pos.pop();
    write_partition(&dir, "short", &short).unwrap();
    assert!(matches!(
        read_partition(&dir, "short", 0),
        Err(SlidingMeshError::NodeCountMismatch {
            side: NodeSide::Rotated,
            what: "loc_pos",
            ..
        })
    ));

    let mut future = ring.partition(0);
    future.version = 99;
    write_partition(&dir, "future", &future).unwrap();
    assert!(matches!(
        read_partition(&dir, "future", 0),
        Err(SlidingMeshError::MalformedPartition(_))
    ));

    let mut dangling = ring.partition(0);
    dangling.topology.interfaces[0].fixed_elements[2].ien[0] = 10_000;
    write_partition(&dir, "dangling", &dangling).unwrap();
    assert!(matches!(
        read_partition(&dir, "dangling", 0),
        Err(SlidingMeshError::ConnectivityOutOfRange { node: 10_000, .. })
    ));

    assert!(matches!(
        read_partition(&dir, "missing", 0),
        Err(SlidingMeshError::Io(_))
    ));
    fs::remove_dir_all(&dir).unwrap();
}
