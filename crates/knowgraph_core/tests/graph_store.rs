use knowgraph_core::db::open_db_in_memory;
use knowgraph_core::{
    EntityKind, FixedSummary, GraphError, GraphRepository, GraphService, NewRelation, NodeUpdate,
    RelationTypeDraft, SqliteGraphRepository, SummaryError,
};
use std::cell::Cell;
use uuid::Uuid;

fn summary() -> FixedSummary {
    FixedSummary("  A short explanation.  ".to_string())
}

#[test]
fn create_node_stores_trimmed_title_and_summary() {
    let conn = open_db_in_memory().unwrap();
    let service = GraphService::new(SqliteGraphRepository::try_new(&conn).unwrap());

    let node = service.create_node("  Dog ", &summary()).unwrap();
    assert_eq!(node.title, "Dog");
    assert_eq!(node.summary, "A short explanation.");
    assert!(!node.is_instance);

    let loaded = service.get_node(node.id).unwrap().unwrap();
    assert_eq!(loaded, node);
}

#[test]
fn titles_differing_only_in_case_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service = GraphService::new(SqliteGraphRepository::try_new(&conn).unwrap());

    service.create_node("Mammal", &summary()).unwrap();
    let err = service.create_node("mAMMAL", &summary()).unwrap_err();
    assert!(matches!(err, GraphError::DuplicateTitle(ref title) if title == "mAMMAL"));
    assert_eq!(service.list_nodes().unwrap().len(), 1);
}

#[test]
fn duplicate_title_is_detected_before_generating_a_summary() {
    let conn = open_db_in_memory().unwrap();
    let service = GraphService::new(SqliteGraphRepository::try_new(&conn).unwrap());
    service.create_node("Cat", &summary()).unwrap();

    let calls = Cell::new(0);
    let counting = |_title: &str| -> Result<String, SummaryError> {
        calls.set(calls.get() + 1);
        Ok("unused".to_string())
    };
    let err = service.create_node("CAT", &counting).unwrap_err();
    assert!(matches!(err, GraphError::DuplicateTitle(_)));
    assert_eq!(calls.get(), 0);
}

#[test]
fn blank_title_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service = GraphService::new(SqliteGraphRepository::try_new(&conn).unwrap());

    let err = service.create_node("   ", &summary()).unwrap_err();
    assert!(matches!(
        err,
        GraphError::BlankName {
            kind: EntityKind::Node
        }
    ));
}

#[test]
fn generation_failure_leaves_store_unchanged() {
    let conn = open_db_in_memory().unwrap();
    let service = GraphService::new(SqliteGraphRepository::try_new(&conn).unwrap());

    let failing =
        |_title: &str| -> Result<String, SummaryError> { Err(SummaryError::new("model offline")) };
    let err = service.create_node("Whale", &failing).unwrap_err();
    assert!(matches!(err, GraphError::GenerationFailed(ref message) if message == "model offline"));
    assert!(service.list_nodes().unwrap().is_empty());
}

#[test]
fn update_node_overwrites_without_uniqueness_check() {
    // Renaming onto an existing title is accepted; only creation checks titles.
    let conn = open_db_in_memory().unwrap();
    let service = GraphService::new(SqliteGraphRepository::try_new(&conn).unwrap());
    service.create_node("Dog", &summary()).unwrap();
    let cat = service.create_node("Cat", &summary()).unwrap();

    let renamed = service.update_node(cat.id, &NodeUpdate::title("dog")).unwrap();
    assert_eq!(renamed.title, "dog");
    assert_eq!(renamed.summary, "A short explanation.");

    let edited = service
        .update_node(cat.id, &NodeUpdate::summary("Purrs."))
        .unwrap();
    assert_eq!(edited.title, "dog");
    assert_eq!(edited.summary, "Purrs.");
}

#[test]
fn update_missing_node_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = GraphService::new(SqliteGraphRepository::try_new(&conn).unwrap());

    let err = service
        .update_node(Uuid::new_v4(), &NodeUpdate::title("x"))
        .unwrap_err();
    assert!(matches!(
        err,
        GraphError::NotFound {
            kind: EntityKind::Node,
            ..
        }
    ));
}

#[test]
fn relation_type_names_are_unique_case_insensitively() {
    let conn = open_db_in_memory().unwrap();
    let service = GraphService::new(SqliteGraphRepository::try_new(&conn).unwrap());

    let created = service
        .create_relation_type(
            &RelationTypeDraft::new(" part of ")
                .with_inverse(" has part ")
                .transitive(true),
        )
        .unwrap();
    assert_eq!(created.name, "part of");
    assert_eq!(created.inverse_name, "has part");
    assert!(created.is_transitive);
    assert!(!created.is_symmetric);

    let err = service
        .create_relation_type(&RelationTypeDraft::new("PART OF"))
        .unwrap_err();
    assert!(matches!(err, GraphError::DuplicateRelationType(_)));

    let err = service
        .create_relation_type(&RelationTypeDraft::new("  "))
        .unwrap_err();
    assert!(matches!(
        err,
        GraphError::BlankName {
            kind: EntityKind::RelationType
        }
    ));
    assert_eq!(service.list_relation_types().unwrap().len(), 1);
}

#[test]
fn update_relation_type_overwrites_every_field() {
    let conn = open_db_in_memory().unwrap();
    let service = GraphService::new(SqliteGraphRepository::try_new(&conn).unwrap());
    let kind = service
        .create_relation_type(&RelationTypeDraft::new("near"))
        .unwrap();

    let updated = service
        .update_relation_type(
            kind.id,
            &RelationTypeDraft::new("adjacent to")
                .with_inverse("adjacent to")
                .symmetric(true),
        )
        .unwrap();
    assert_eq!(updated.name, "adjacent to");
    assert!(updated.is_symmetric);
    assert_eq!(service.get_relation_type(kind.id).unwrap(), Some(updated));

    let err = service
        .update_relation_type(Uuid::new_v4(), &RelationTypeDraft::new("x"))
        .unwrap_err();
    assert!(matches!(err, GraphError::NotFound { .. }));
}

#[test]
fn referenced_node_and_type_report_exact_reference_count() {
    let conn = open_db_in_memory().unwrap();
    let service = GraphService::new(SqliteGraphRepository::try_new(&conn).unwrap());
    let dog = service.create_node("Dog", &summary()).unwrap();
    let mammal = service.create_node("Mammal", &summary()).unwrap();
    let animal = service.create_node("Animal", &summary()).unwrap();
    let is_a = service
        .create_relation_type(&RelationTypeDraft::new("is_a"))
        .unwrap();

    let first = service
        .create_relation(&NewRelation::new(dog.id, mammal.id, is_a.id))
        .unwrap();
    let second = service
        .create_relation(&NewRelation::new(mammal.id, animal.id, is_a.id))
        .unwrap();

    match service.delete_node(mammal.id).unwrap_err() {
        GraphError::ReferencedEntity { kind, id, count } => {
            assert_eq!(kind, EntityKind::Node);
            assert_eq!(id, mammal.id);
            assert_eq!(count, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
    match service.delete_relation_type(is_a.id).unwrap_err() {
        GraphError::ReferencedEntity { count, .. } => assert_eq!(count, 2),
        other => panic!("unexpected error: {other}"),
    }
    assert!(service.get_node(mammal.id).unwrap().is_some());

    service.delete_relation(first.id).unwrap();
    service.delete_relation(second.id).unwrap();
    service.delete_node(mammal.id).unwrap();
    service.delete_relation_type(is_a.id).unwrap();

    assert!(service.get_node(mammal.id).unwrap().is_none());
    assert!(service.list_relation_types().unwrap().is_empty());
}

#[test]
fn deleting_missing_entities_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = GraphService::new(SqliteGraphRepository::try_new(&conn).unwrap());

    assert!(matches!(
        service.delete_node(Uuid::new_v4()).unwrap_err(),
        GraphError::NotFound {
            kind: EntityKind::Node,
            ..
        }
    ));
    assert!(matches!(
        service.delete_relation(Uuid::new_v4()).unwrap_err(),
        GraphError::NotFound {
            kind: EntityKind::Relation,
            ..
        }
    ));
}

#[test]
fn relation_writes_open_their_own_immediate_transaction() {
    let conn = open_db_in_memory().unwrap();
    let service = GraphService::new(SqliteGraphRepository::try_new(&conn).unwrap());
    let dog = service.create_node("Dog", &summary()).unwrap();
    let mammal = service.create_node("Mammal", &summary()).unwrap();
    let is_a = service
        .create_relation_type(&RelationTypeDraft::new("is_a"))
        .unwrap();
    let edge = service
        .create_relation(&NewRelation::new(dog.id, mammal.id, is_a.id))
        .unwrap();

    // An outer transaction makes the nested BEGIN IMMEDIATE fail.
    conn.execute_batch("BEGIN;").unwrap();
    assert!(matches!(
        service
            .update_relation_type(is_a.id, &RelationTypeDraft::new("kind of"))
            .unwrap_err(),
        GraphError::Db(_)
    ));
    assert!(matches!(
        service.delete_relation(edge.id).unwrap_err(),
        GraphError::Db(_)
    ));
    conn.execute_batch("ROLLBACK;").unwrap();

    let renamed = service
        .update_relation_type(is_a.id, &RelationTypeDraft::new("kind of"))
        .unwrap();
    assert_eq!(service.get_relation_type(is_a.id).unwrap(), Some(renamed));
    service.delete_relation(edge.id).unwrap();
    assert!(service.get_relation(edge.id).unwrap().is_none());
    assert!(matches!(
        service.delete_relation(edge.id).unwrap_err(),
        GraphError::NotFound { .. }
    ));
    assert!(service.get_node(dog.id).unwrap().is_some());
}

#[test]
fn instance_of_relation_marks_source_node() {
    let conn = open_db_in_memory().unwrap();
    let service = GraphService::new(SqliteGraphRepository::try_new(&conn).unwrap());
    let rex = service.create_node("Rex", &summary()).unwrap();
    let dog = service.create_node("Dog", &summary()).unwrap();
    let smoke = service.create_node("Smoke", &summary()).unwrap();
    let fire = service.create_node("Fire", &summary()).unwrap();
    let instance_of = service
        .create_relation_type(&RelationTypeDraft::new("is an Instance of"))
        .unwrap();
    let causes = service
        .create_relation_type(&RelationTypeDraft::new("causes"))
        .unwrap();

    service
        .create_relation(&NewRelation::new(rex.id, dog.id, instance_of.id))
        .unwrap();
    service
        .create_relation(&NewRelation::new(fire.id, smoke.id, causes.id))
        .unwrap();

    assert!(service.get_node(rex.id).unwrap().unwrap().is_instance);
    assert!(!service.get_node(dog.id).unwrap().unwrap().is_instance);
    assert!(!service.get_node(fire.id).unwrap().unwrap().is_instance);
}

#[test]
fn generic_node_update_cannot_clear_instance_flag() {
    let conn = open_db_in_memory().unwrap();
    let service = GraphService::new(SqliteGraphRepository::try_new(&conn).unwrap());
    let rex = service.create_node("Rex", &summary()).unwrap();
    let dog = service.create_node("Dog", &summary()).unwrap();
    let instance_of = service
        .create_relation_type(&RelationTypeDraft::new("instance of"))
        .unwrap();
    service
        .create_relation(&NewRelation::new(rex.id, dog.id, instance_of.id))
        .unwrap();

    let updated = service
        .update_node(rex.id, &NodeUpdate::summary("A good dog."))
        .unwrap();
    assert!(updated.is_instance);
}

#[test]
fn relation_to_missing_node_or_type_is_rejected_atomically() {
    let conn = open_db_in_memory().unwrap();
    let service = GraphService::new(SqliteGraphRepository::try_new(&conn).unwrap());
    let dog = service.create_node("Dog", &summary()).unwrap();
    let likes = service
        .create_relation_type(&RelationTypeDraft::new("likes"))
        .unwrap();

    let err = service
        .create_relation(&NewRelation::new(dog.id, Uuid::new_v4(), likes.id))
        .unwrap_err();
    assert!(matches!(
        err,
        GraphError::NotFound {
            kind: EntityKind::Node,
            ..
        }
    ));
    let err = service
        .create_relation(&NewRelation::new(dog.id, dog.id, Uuid::new_v4()))
        .unwrap_err();
    assert!(matches!(
        err,
        GraphError::NotFound {
            kind: EntityKind::RelationType,
            ..
        }
    ));
    assert!(service.list_relations().unwrap().is_empty());
}

#[test]
fn relation_qualifiers_are_stored_and_listed_with_labels() {
    let conn = open_db_in_memory().unwrap();
    let service = GraphService::new(SqliteGraphRepository::try_new(&conn).unwrap());
    let birds = service.create_node("Bird", &summary()).unwrap();
    let fly = service.create_node("Flying", &summary()).unwrap();
    let can = service
        .create_relation_type(&RelationTypeDraft::new("can do"))
        .unwrap();

    let relation = service
        .create_relation(
            &NewRelation::new(birds.id, fly.id, can.id)
                .with_modality("possibly")
                .with_subject_quantifier("most")
                .with_object_quantifier("some"),
        )
        .unwrap();
    assert_eq!(relation.modality.as_deref(), Some("possibly"));

    let views = service.list_relations().unwrap();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].relation, relation);
    assert_eq!(views[0].source_title, "Bird");
    assert_eq!(views[0].relation_name, "can do");
    assert_eq!(views[0].target_title, "Flying");
    assert_eq!(service.get_relation(relation.id).unwrap(), Some(relation));
}

#[test]
fn neighbors_return_center_then_outgoing_targets() {
    let conn = open_db_in_memory().unwrap();
    let service = GraphService::new(SqliteGraphRepository::try_new(&conn).unwrap());
    let dog = service.create_node("Dog", &summary()).unwrap();
    let mammal = service.create_node("Mammal", &summary()).unwrap();
    let bone = service.create_node("Bone", &summary()).unwrap();
    let is_a = service
        .create_relation_type(&RelationTypeDraft::new("is_a"))
        .unwrap();
    let likes = service
        .create_relation_type(&RelationTypeDraft::new("likes"))
        .unwrap();
    service
        .create_relation(&NewRelation::new(dog.id, mammal.id, is_a.id))
        .unwrap();
    service
        .create_relation(&NewRelation::new(dog.id, bone.id, likes.id))
        .unwrap();
    // Incoming edges are not part of the neighborhood.
    service
        .create_relation(&NewRelation::new(bone.id, dog.id, likes.id))
        .unwrap();

    let hood = service.neighbors(dog.id).unwrap();
    let titles: Vec<&str> = hood.nodes.iter().map(|node| node.title.as_str()).collect();
    assert_eq!(titles, vec!["Dog", "Mammal", "Bone"]);
    let labels: Vec<&str> = hood.edges.iter().map(|edge| edge.label.as_str()).collect();
    assert_eq!(labels, vec!["is_a", "likes"]);
    assert!(hood.edges.iter().all(|edge| edge.source == dog.id));

    assert!(matches!(
        service.neighbors(Uuid::new_v4()).unwrap_err(),
        GraphError::NotFound { .. }
    ));
}

#[test]
fn repository_can_be_used_without_the_service() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGraphRepository::try_new(&conn).unwrap();

    let node = repo.create_node("Raw", "Inserted directly.").unwrap();
    assert!(repo.node_title_exists("RAW").unwrap());
    assert!(!repo.node_title_exists("Cooked").unwrap());
    assert_eq!(repo.list_nodes().unwrap(), vec![node]);
}
