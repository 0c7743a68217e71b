use eunhad::db;
use eunhad::records::AbsenceCount;
use eunhad::{Capability, ClassId, Confirmation, Records, StoreError};

const DAY: &str = "2024-05-01";

fn records() -> Records {
    Records::load(db::open_in_memory().expect("db")).expect("records")
}

#[test]
fn toggle_then_remove_leaves_no_orphans() {
    let mut r = records();
    r.add_student(Capability::Admin, ClassId::Green, "민준")
        .expect("add");

    let count = r
        .toggle_absent(DAY, ClassId::Green, "민준", true)
        .expect("toggle");
    assert_eq!(count, AbsenceCount { absent: 1, total: 1 });

    let removed = r
        .remove_student(Capability::Admin, ClassId::Green, "민준", Confirmation::Confirmed)
        .expect("remove")
        .applied()
        .expect("applied");
    assert_eq!(removed.marks_removed, 1);

    assert!(r.roster().students(ClassId::Green).is_empty());
    assert!(!r.attendance().is_absent(DAY, ClassId::Green, "민준"));
    assert_eq!(r.roster().to_blob().expect("blob"), r#"{"green":[]}"#);
}

#[test]
fn cascade_spans_dates_and_spares_other_classes() {
    let mut r = records();
    for class_id in [ClassId::Green, ClassId::Yellow] {
        r.add_student(Capability::Admin, class_id, "민준").expect("add");
    }
    for day in ["2024-05-01", "2024-05-02", "2024-05-03"] {
        r.toggle_absent(day, ClassId::Green, "민준", true).expect("toggle");
    }
    r.toggle_absent("2024-05-02", ClassId::Yellow, "민준", true)
        .expect("toggle");

    let removed = r
        .remove_student(Capability::Admin, ClassId::Green, "민준", Confirmation::Confirmed)
        .expect("remove")
        .applied()
        .expect("applied");
    assert_eq!(removed.marks_removed, 3);
    assert!(r.attendance().dates_for(ClassId::Green, "민준").is_empty());
    assert_eq!(
        r.attendance().dates_for(ClassId::Yellow, "민준"),
        vec!["2024-05-02"]
    );
}

#[test]
fn duplicate_is_case_and_space_insensitive() {
    let mut r = records();
    r.add_student(Capability::Admin, ClassId::Rabbit, "Emma  Kim")
        .expect("add");
    let err = r
        .add_student(Capability::Admin, ClassId::Rabbit, " emma kim ")
        .expect_err("duplicate");
    match err {
        StoreError::Duplicate { class, .. } => assert_eq!(class, "토끼반"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(r
        .add_student(Capability::Admin, ClassId::Deer, "emma kim")
        .expect("other class")
        .is_applied());
}

#[test]
fn remove_matches_stored_spelling() {
    let mut r = records();
    r.add_student(Capability::Admin, ClassId::Giraffe, "Emma Kim")
        .expect("add");
    r.toggle_absent(DAY, ClassId::Giraffe, "emma kim", true)
        .expect("toggle");
    assert_eq!(r.absentees(DAY, ClassId::Giraffe).expect("day"), vec!["Emma Kim"]);

    let removed = r
        .remove_student(Capability::Admin, ClassId::Giraffe, "EMMA KIM", Confirmation::Confirmed)
        .expect("remove")
        .applied()
        .expect("applied");
    assert_eq!(removed.name, "Emma Kim");
    assert_eq!(removed.marks_removed, 1);
}
