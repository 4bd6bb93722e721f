use std::fs;

use stagehand::replicate::{self, PROJECT_DATA_RELATIVE};
use stagehand::table::NameTable;

const SCENE: &str = concat!(
    "#4.0# \"Club Set\" \"\" %000000000 1\n",
    "/config/mono\n",
    "/ch/01/config \"Kick\" 1 RD 1\n",
    "/ch/02/config \"Snare\" 2 GN 2\n",
    "/auxin/01/config \"Click\" 3 BL 33\n",
    "/ch/01/mix ON -10.0 OFF +0 OFF -oo\n",
);

#[test]
fn create_flow_replicates_a_mixed_base_directory() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("base");
    fs::create_dir_all(&base).unwrap();

    fs::write(base.join("club.scn"), SCENE).unwrap();

    let bundle = base.join("club.logicx");
    fs::create_dir_all(bundle.join("Alternatives/000")).unwrap();
    fs::create_dir_all(bundle.join("Resources")).unwrap();
    fs::write(bundle.join("Resources/info.plist"), b"untouched").unwrap();
    fs::write(
        bundle.join(PROJECT_DATA_RELATIVE),
        b"\x10\x00Kick________________\x00Snare_______________\x00",
    )
    .unwrap();

    let table_path = dir.path().join("names.csv");
    fs::write(
        &table_path,
        "Base,Fri,#notes,Sat\nKick,Kick F,skip,Kick S\nSnare,Snare F,skip,\n",
    )
    .unwrap();
    let table = NameTable::load(&table_path).unwrap();
    let target = dir.path().join("out");

    let summaries = replicate::replicate_all(&base, &table, &target).unwrap();
    assert_eq!(summaries.len(), 2);
    assert!(summaries.iter().all(|s| s.created == 2));

    // Comment column produced no output.
    assert!(!target.join("club_#notes.scn").exists());

    // Scene variants: renamed channels, retitled header, untouched lines
    // preserved verbatim.
    let fri_scene = fs::read_to_string(target.join("club_Fri.scn")).unwrap();
    assert!(fri_scene.contains("#4.0# \"club_Fri\" \"\" %000000000 1\n"));
    assert!(fri_scene.contains("/ch/01/config \"Kick F\" 1 RD 1\n"));
    assert!(fri_scene.contains("/ch/01/mix ON -10.0 OFF +0 OFF -oo\n"));

    let sat_scene = fs::read_to_string(target.join("club_Sat.scn")).unwrap();
    // Empty Sat cell disables the snare channel.
    assert!(sat_scene.contains("/ch/02/config \"\" 1 OFF 0\n"));

    // Project variants: same length blob, renamed slots, other files intact.
    let original_len = fs::read(bundle.join(PROJECT_DATA_RELATIVE)).unwrap().len();
    let fri_blob = fs::read(
        target
            .join("club_Fri.logicx")
            .join(PROJECT_DATA_RELATIVE),
    )
    .unwrap();
    assert_eq!(fri_blob.len(), original_len);
    assert!(fri_blob.windows(6).any(|w| w == b"Kick F"));
    assert_eq!(
        fs::read(target.join("club_Sat.logicx").join("Resources/info.plist")).unwrap(),
        b"untouched"
    );

    // Re-running the same create skips every existing target.
    let again = replicate::replicate_all(&base, &table, &target).unwrap();
    assert!(again.iter().all(|s| s.created == 0));
}
