use serde::Deserialize;
use shelf_db::Novel;
use shelf_http::identity::CurrentUser;

/// Submitted add/edit form. Missing fields decode as empty strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NovelForm {
    pub title: String,
    pub author: String,
    pub published_date: String,
    #[serde(rename = "imageURL")]
    pub image_url: String,
    pub description: String,
    pub created_by: String,
    #[serde(rename = "createdByID")]
    pub created_by_id: String,
}

impl NovelForm {
    /// Build the record a form describes. The id stays unset.
    ///
    /// A form without `createdByID` is attributed to the caller, or to the
    /// anonymous creator when there is no caller.
    pub fn into_novel(self, user: Option<&CurrentUser>) -> Novel {
        let mut novel = Novel {
            title: self.title,
            author: self.author,
            published_date: self.published_date,
            image_url: self.image_url,
            description: self.description,
            created_by: self.created_by,
            created_by_id: self.created_by_id,
            ..Novel::default()
        };

        if novel.created_by_id.is_empty() {
            match user {
                Some(user) => {
                    novel.created_by = user.display_name.clone();
                    novel.created_by_id = user.id.clone();
                }
                None => novel.set_creator_anonymous(),
            }
        }

        novel
    }
}
