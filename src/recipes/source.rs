use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{model::Recipe, repo};

/// Read access to the recipe catalog. The planner only talks to this trait so
/// it can run against Postgres or an in-memory catalog.
#[async_trait]
pub trait RecipeSource: Send + Sync {
    async fn list(&self, kind: Option<&str>, limit: i64, offset: i64)
        -> anyhow::Result<Vec<Recipe>>;
    async fn catalog(&self) -> anyhow::Result<Vec<Recipe>>;
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Recipe>>;
    async fn get_many(&self, ids: &[Uuid]) -> anyhow::Result<Vec<Recipe>>;
}

#[derive(Clone)]
pub struct PgRecipes {
    db: PgPool,
}

impl PgRecipes {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecipeSource for PgRecipes {
    async fn list(
        &self,
        kind: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Recipe>> {
        let rows = repo::list(&self.db, kind, limit, offset).await?;
        Ok(rows.into_iter().map(Recipe::from).collect())
    }

    async fn catalog(&self) -> anyhow::Result<Vec<Recipe>> {
        let rows = repo::list_all(&self.db).await?;
        Ok(rows.into_iter().map(Recipe::from).collect())
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Recipe>> {
        Ok(repo::get(&self.db, id).await?.map(Recipe::from))
    }

    async fn get_many(&self, ids: &[Uuid]) -> anyhow::Result<Vec<Recipe>> {
        let rows = repo::get_many(&self.db, ids).await?;
        Ok(rows.into_iter().map(Recipe::from).collect())
    }
}

/// Fixed catalog kept in memory.
#[derive(Clone, Default)]
pub struct InMemoryRecipes {
    recipes: Vec<Recipe>,
}

impl InMemoryRecipes {
    pub fn new(recipes: Vec<Recipe>) -> Self {
        Self { recipes }
    }
}

#[async_trait]
impl RecipeSource for InMemoryRecipes {
    async fn list(
        &self,
        kind: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Recipe>> {
        let mut matching: Vec<Recipe> = self
            .recipes
            .iter()
            .filter(|r| kind.map_or(true, |k| r.is_kind(k)))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn catalog(&self) -> anyhow::Result<Vec<Recipe>> {
        Ok(self.recipes.clone())
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Recipe>> {
        Ok(self.recipes.iter().find(|r| r.id == id).cloned())
    }

    async fn get_many(&self, ids: &[Uuid]) -> anyhow::Result<Vec<Recipe>> {
        Ok(self
            .recipes
            .iter()
            .filter(|r| ids.contains(&r.id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipes::model::fixtures::recipe;

    #[tokio::test]
    async fn in_memory_list_filters_and_pages() {
        let src = InMemoryRecipes::new(vec![
            recipe("Pancakes", "breakfast", 450.0),
            recipe("Omelette", "Breakfast", 300.0),
            recipe("Chili", "dinner", 700.0),
        ]);

        let breakfasts = src.list(Some("breakfast"), 10, 0).await.unwrap();
        let names: Vec<_> = breakfasts.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Omelette", "Pancakes"]);

        let page = src.list(None, 1, 1).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name, "Omelette");
    }

    #[tokio::test]
    async fn in_memory_get_many_skips_unknown_ids() {
        let chili = recipe("Chili", "dinner", 700.0);
        let src = InMemoryRecipes::new(vec![chili.clone()]);
        let found = src.get_many(&[chili.id, Uuid::new_v4()]).await.unwrap();
        assert_eq!(found, vec![chili]);
    }
}
