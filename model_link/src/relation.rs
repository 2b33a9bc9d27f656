//! Relation declaration
//!
//! Registers both directions of a one-to-one, many-to-one or many-to-many
//! relation on a pair of models. Foreign-key relations always use RESTRICT
//! for delete and update.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::models::{AssociationOptions, Model, ReferentialAction, ThroughOptions};

/// The three supported relation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    OneToOne,
    ManyToOne,
    ManyToMany,
}

impl RelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::OneToOne => "one-to-one",
            RelationKind::ManyToOne => "many-to-one",
            RelationKind::ManyToMany => "many-to-many",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "one-to-one" | "uno-uno" => Ok(RelationKind::OneToOne),
            "many-to-one" | "muchos-uno" => Ok(RelationKind::ManyToOne),
            "many-to-many" | "muchos-muchos" => Ok(RelationKind::ManyToMany),
            other => Err(Error::InvalidRelationKind(other.to_string())),
        }
    }
}

/// A foreign-key link: `source` holds `foreign_key` referencing `target`
#[derive(Debug)]
pub struct Link<'a> {
    pub source: &'a mut Model,
    pub target: &'a mut Model,
    /// Accessor on `source` pointing at `target`
    pub source_alias: &'a str,
    /// Inverse accessor on `target`
    pub target_alias: &'a str,
    pub foreign_key: &'a str,
}

/// A many-to-many link through `pivot`
#[derive(Debug)]
pub struct PivotLink<'a> {
    pub source: &'a mut Model,
    pub target: &'a mut Model,
    pub source_alias: &'a str,
    pub target_alias: &'a str,
    /// Key of `source` inside the pivot
    pub source_foreign_key: &'a str,
    /// Key of `target` inside the pivot
    pub target_foreign_key: &'a str,
    pub pivot: &'a Model,
}

/// A relation between two models, carrying exactly what its kind needs
#[derive(Debug)]
pub enum Relation<'a> {
    OneToOne(Link<'a>),
    ManyToOne(Link<'a>),
    ManyToMany(PivotLink<'a>),
}

impl Relation<'_> {
    pub fn kind(&self) -> RelationKind {
        match self {
            Relation::OneToOne(_) => RelationKind::OneToOne,
            Relation::ManyToOne(_) => RelationKind::ManyToOne,
            Relation::ManyToMany(_) => RelationKind::ManyToMany,
        }
    }
}

fn restrict(alias: &str, foreign_key: &str) -> AssociationOptions {
    AssociationOptions::new(alias, foreign_key)
        .on_delete(ReferentialAction::Restrict)
        .on_update(ReferentialAction::Restrict)
}

/// Register both directions of `relation`.
///
/// Both sides are checked before either model is touched, so an error leaves
/// the models unchanged.
pub fn declare_relation(relation: Relation<'_>) -> Result<()> {
    let kind = relation.kind();

    match relation {
        Relation::OneToOne(link) | Relation::ManyToOne(link) => {
            link.source.check_association(link.source_alias, link.foreign_key)?;
            link.target.check_association(link.target_alias, link.foreign_key)?;

            link.source
                .belongs_to(link.target, restrict(link.source_alias, link.foreign_key))?;

            let inverse = restrict(link.target_alias, link.foreign_key);
            if kind == RelationKind::OneToOne {
                link.target.has_one(link.source, inverse)?;
            } else {
                link.target.has_many(link.source, inverse)?;
            }

            tracing::debug!(
                kind = %kind,
                source = link.source.name(),
                target = link.target.name(),
                foreign_key = link.foreign_key,
                "Declared relation"
            );
        }
        Relation::ManyToMany(link) => {
            link.source
                .check_association(link.source_alias, link.source_foreign_key)?;
            link.target
                .check_association(link.target_alias, link.target_foreign_key)?;

            link.source.belongs_to_many(
                link.target,
                ThroughOptions::new(link.source_alias, link.pivot, link.source_foreign_key),
            )?;
            link.target.belongs_to_many(
                link.source,
                ThroughOptions::new(link.target_alias, link.pivot, link.target_foreign_key),
            )?;

            tracing::debug!(
                kind = %kind,
                source = link.source.name(),
                target = link.target.name(),
                pivot = link.pivot.name(),
                "Declared relation"
            );
        }
    }

    Ok(())
}

/// String-keyed form of [`declare_relation`].
///
/// `kind` is validated first; `many-to-many` additionally requires
/// `fk_b` and `pivot`. Nothing is registered when either check fails.
#[allow(clippy::too_many_arguments)]
pub fn relate(
    kind: &str,
    model_a: &mut Model,
    model_b: &mut Model,
    alias_a: &str,
    alias_b: &str,
    fk_a: &str,
    fk_b: Option<&str>,
    pivot: Option<&Model>,
) -> Result<()> {
    let kind: RelationKind = kind.parse()?;

    let relation = match kind {
        RelationKind::OneToOne | RelationKind::ManyToOne => {
            let link = Link {
                source: model_a,
                target: model_b,
                source_alias: alias_a,
                target_alias: alias_b,
                foreign_key: fk_a,
            };
            if kind == RelationKind::OneToOne {
                Relation::OneToOne(link)
            } else {
                Relation::ManyToOne(link)
            }
        }
        RelationKind::ManyToMany => {
            let target_foreign_key = fk_b.ok_or_else(|| {
                Error::InvalidRelation(
                    "many-to-many requires a foreign key for the second model".to_string(),
                )
            })?;
            let pivot = pivot.ok_or_else(|| {
                Error::InvalidRelation("many-to-many requires a pivot model".to_string())
            })?;

            Relation::ManyToMany(PivotLink {
                source: model_a,
                target: model_b,
                source_alias: alias_a,
                target_alias: alias_b,
                source_foreign_key: fk_a,
                target_foreign_key,
                pivot,
            })
        }
    };

    declare_relation(relation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AssociationKind;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("one-to-one", RelationKind::OneToOne)]
    #[case("uno-uno", RelationKind::OneToOne)]
    #[case("many-to-one", RelationKind::ManyToOne)]
    #[case("muchos-uno", RelationKind::ManyToOne)]
    #[case("many-to-many", RelationKind::ManyToMany)]
    #[case("muchos-muchos", RelationKind::ManyToMany)]
    fn parses_kinds(#[case] input: &str, #[case] expected: RelationKind) {
        assert_eq!(input.parse::<RelationKind>().unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("one-to-many")]
    #[case("Many-To-One")]
    #[case("uno-muchos")]
    fn unknown_kind_leaves_models_untouched(#[case] kind: &str) {
        let mut a = Model::new("a");
        let mut b = Model::new("b");
        let pivot = Model::new("ab");

        let err = relate(kind, &mut a, &mut b, "b", "as", "b_id", Some("a_id"), Some(&pivot))
            .unwrap_err();

        assert!(matches!(err, Error::InvalidRelationKind(_)));
        assert!(a.associations().is_empty());
        assert!(b.associations().is_empty());
    }

    #[test]
    fn one_to_one_registers_each_side_once_with_restrict() {
        let mut persona = Model::new("persona");
        let mut pasaporte = Model::new("pasaporte");

        declare_relation(Relation::OneToOne(Link {
            source: &mut persona,
            target: &mut pasaporte,
            source_alias: "pasaporte",
            target_alias: "titular",
            foreign_key: "pasaporte_id",
        }))
        .unwrap();

        assert_eq!(persona.associations().len(), 1);
        assert_eq!(pasaporte.associations().len(), 1);

        let forward = &persona.associations()[0];
        assert_eq!(forward.kind, AssociationKind::BelongsTo);
        assert_eq!(forward.target, "pasaporte");
        assert_eq!(forward.source_key, "id");

        let inverse = &pasaporte.associations()[0];
        assert_eq!(inverse.kind, AssociationKind::HasOne);
        assert_eq!(inverse.alias, "titular");
        assert!(!inverse.is_collection());

        for association in [forward, inverse] {
            assert_eq!(association.foreign_key, "pasaporte_id");
            assert_eq!(association.on_delete, Some(ReferentialAction::Restrict));
            assert_eq!(association.on_update, Some(ReferentialAction::Restrict));
        }
    }

    #[test]
    fn many_to_one_inverse_is_a_collection() {
        let mut localidad = Model::new("localidad");
        let mut provincia = Model::new("provincia");

        relate(
            "many-to-one",
            &mut localidad,
            &mut provincia,
            "provincia",
            "localidades",
            "provincia_id",
            None,
            None,
        )
        .unwrap();

        let forward = localidad.association("provincia").unwrap();
        assert_eq!(forward.kind, AssociationKind::BelongsTo);
        assert!(!forward.is_collection());

        let inverse = provincia.association("localidades").unwrap();
        assert_eq!(inverse.kind, AssociationKind::HasMany);
        assert!(inverse.is_collection());
        assert_eq!(inverse.on_delete, Some(ReferentialAction::Restrict));
    }

    #[test]
    fn many_to_many_goes_through_pivot() {
        let mut alumno = Model::new("alumno");
        let mut curso = Model::new("curso");
        let inscripcion = Model::new("inscripcion").table_name_as("inscripciones");

        relate(
            "many-to-many",
            &mut alumno,
            &mut curso,
            "cursos",
            "alumnos",
            "alumno_id",
            Some("curso_id"),
            Some(&inscripcion),
        )
        .unwrap();

        let cursos = alumno.association("cursos").unwrap();
        assert_eq!(cursos.kind, AssociationKind::BelongsToMany);
        assert_eq!(cursos.through.as_deref(), Some("inscripciones"));
        assert_eq!(cursos.foreign_key, "alumno_id");

        let alumnos = curso.association("alumnos").unwrap();
        assert_eq!(alumnos.through.as_deref(), Some("inscripciones"));
        assert_eq!(alumnos.foreign_key, "curso_id");
        assert!(alumnos.is_collection());
    }

    #[rstest]
    #[case(None, Some("curso_id"))]
    #[case(Some("inscripcion"), None)]
    #[case(None, None)]
    fn many_to_many_requires_pivot_and_second_key(
        #[case] pivot_name: Option<&str>,
        #[case] fk_b: Option<&str>,
    ) {
        let mut alumno = Model::new("alumno");
        let mut curso = Model::new("curso");
        let pivot = pivot_name.map(Model::new);

        let err = relate(
            "many-to-many",
            &mut alumno,
            &mut curso,
            "cursos",
            "alumnos",
            "alumno_id",
            fk_b,
            pivot.as_ref(),
        )
        .unwrap_err();

        assert!(matches!(err, Error::InvalidRelation(_)));
        assert!(alumno.associations().is_empty());
        assert!(curso.associations().is_empty());
    }

    #[test]
    fn taken_inverse_alias_fails_before_either_side_changes() {
        let mut localidad = Model::new("localidad");
        let mut provincia = Model::new("provincia");
        let other = Model::new("region");
        provincia
            .has_many(&other, AssociationOptions::new("localidades", "provincia_id"))
            .unwrap();

        let err = relate(
            "many-to-one",
            &mut localidad,
            &mut provincia,
            "provincia",
            "localidades",
            "provincia_id",
            None,
            None,
        )
        .unwrap_err();

        assert!(matches!(err, Error::ModelDefinition(_)));
        assert!(localidad.associations().is_empty());
        assert_eq!(provincia.associations().len(), 1);
    }
}
