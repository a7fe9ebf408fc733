use assert_cmd::Command;
use predicates::prelude::predicate::str;

#[test]
fn part1_output_right_answer() {
    let mut cmd = Command::cargo_bin("part1").unwrap();
    cmd.write_stdin("xmul(2,4)%&mul[3,7]!@^do_not_mul(5,5)+mul(32,64]then(mul(11,8)mul(8,5))");

    cmd.assert().success().stdout(str::contains("161"));
}

#[test]
fn part1_ignores_toggles() {
    let mut cmd = Command::cargo_bin("part1").unwrap();
    cmd.write_stdin("mul(2,4)don't()mul(5,5)do()mul(3,3)");

    cmd.assert().success().stdout(str::contains("42"));
}

#[test]
fn part1_sums_all_files() {
    let dir = format!("{}/tests/data", env!("CARGO_MANIFEST_DIR"));
    let mut cmd = Command::cargo_bin("part1").unwrap();
    cmd.arg(format!("{}/first.txt", dir))
        .arg(format!("{}/second.txt", dir));

    cmd.assert().success().stdout(str::contains("49"));
}
