use sqlx::postgres::PgConnection;
use sqlx::Connection;
use tracing::debug;

use crate::error::CdcError;

// Row-to-JSON notify functions. The target channel rides in the trigger
// argument so one function pair serves every watched table.
const NOTIFY_NEW_FUNCTION_SQL: &str = r#"
create or replace function senergy_notify_new()
 returns trigger
 language plpgsql
as $$
declare
  channel text := TG_ARGV[0];
  payload text := row_to_json(NEW)::text;
begin
  PERFORM (
     select pg_notify(channel, payload)
  );
  RETURN NULL;
end;
$$;
"#;

const NOTIFY_OLD_FUNCTION_SQL: &str = r#"
create or replace function senergy_notify_old()
 returns trigger
 language plpgsql
as $$
declare
  channel text := TG_ARGV[0];
  payload text := row_to_json(OLD)::text;
begin
  PERFORM (
     select pg_notify(channel, payload)
  );
  RETURN NULL;
end;
$$;
"#;

fn trigger_sql(set_channel: &str, delete_channel: &str, table: &str) -> String {
    format!(
        r#"
DROP TRIGGER IF EXISTS notify_{table}_set
  ON {table};

DROP TRIGGER IF EXISTS notify_{table}_delete
  ON {table};

CREATE TRIGGER notify_{table}_set
AFTER INSERT OR UPDATE
ON {table}
FOR EACH ROW
EXECUTE PROCEDURE senergy_notify_new('{set_channel}');

CREATE TRIGGER notify_{table}_delete
AFTER DELETE
ON {table}
FOR EACH ROW
EXECUTE PROCEDURE senergy_notify_old('{delete_channel}');
"#
    )
}

/// Install (or replace) the notify functions and the set/delete triggers
/// for one engine table. Runs in a single transaction, so a re-run on
/// startup is safe.
pub async fn install_notifier(
    db_url: &str,
    set_channel: &str,
    delete_channel: &str,
    table: &str,
) -> Result<(), CdcError> {
    let mut conn = PgConnection::connect(db_url).await?;
    let mut tx = conn.begin().await?;
    sqlx::query(NOTIFY_NEW_FUNCTION_SQL).execute(&mut *tx).await?;
    sqlx::query(NOTIFY_OLD_FUNCTION_SQL).execute(&mut *tx).await?;
    sqlx::query(&trigger_sql(set_channel, delete_channel, table))
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    debug!(table, set_channel, delete_channel, "installed cdc triggers");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_sql_names_follow_the_table() {
        let sql = trigger_sql(
            "senergy_deployment_set",
            "senergy_deployment_delete",
            "ACT_RE_DEPLOYMENT",
        );
        assert!(sql.contains("CREATE TRIGGER notify_ACT_RE_DEPLOYMENT_set"));
        assert!(sql.contains("CREATE TRIGGER notify_ACT_RE_DEPLOYMENT_delete"));
        assert!(sql.contains("DROP TRIGGER IF EXISTS notify_ACT_RE_DEPLOYMENT_set"));
        assert!(sql.contains("senergy_notify_new('senergy_deployment_set')"));
        assert!(sql.contains("senergy_notify_old('senergy_deployment_delete')"));
    }

    #[test]
    fn notify_functions_publish_row_images() {
        assert!(NOTIFY_NEW_FUNCTION_SQL.contains("senergy_notify_new"));
        assert!(NOTIFY_NEW_FUNCTION_SQL.contains("row_to_json(NEW)"));
        assert!(NOTIFY_OLD_FUNCTION_SQL.contains("senergy_notify_old"));
        assert!(NOTIFY_OLD_FUNCTION_SQL.contains("row_to_json(OLD)"));
    }
}
