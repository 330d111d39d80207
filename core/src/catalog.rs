/// A recipe in the built-in catalog inserted on first start.
pub struct CatalogRecipe {
    pub name: &'static str,
    pub description: &'static str,
    pub instructions: &'static str,
    /// `(ingredient_name, quantity description)` in display order.
    pub ingredients: &'static [(&'static str, &'static str)],
}

pub const CATALOG: &[CatalogRecipe] = &[
    CatalogRecipe {
        name: "Tomato Soup",
        description: "A warm and comforting tomato soup",
        instructions: "1. Heat 2 tbsp olive oil or butter in a pot.
2. Add 2 garlic cloves (minced).
3. Add 4 cups chopped tomatoes.
4. Add 1 cup vegetable broth (or water).
5. Salt, pepper, and herbs to season.
6. Simmer 15-20 minutes.
7. Blend until smooth and garnish.",
        ingredients: &[
            ("tomato", "4 cups chopped"),
            ("garlic", "2 cloves minced"),
            ("olive oil", "2 tbsp"),
            ("vegetable broth", "1 cup"),
        ],
    },
    CatalogRecipe {
        name: "Fruit Salad",
        description: "A refreshing mix of fresh fruits",
        instructions: "1. Combine all fruits in a bowl.
2. Drizzle with honey/lemon.
3. Mix gently to coat.
4. Serve fresh or chilled.",
        ingredients: &[
            ("grapes", "1 cup (halved)"),
            ("apple", "1 large chopped"),
            ("lemon juice", "1 tsp"),
            ("honey", "1 tsp (optional)"),
        ],
    },
    CatalogRecipe {
        name: "Caramel Apples",
        description: "Sweet caramel-coated apples",
        instructions: "1. Insert popsicle sticks in apples.
2. Melt caramel (low heat, stir).
3. Dip apples into caramel.
4. Let set on parchment paper until firm.",
        ingredients: &[
            ("apple", "4 apples"),
            ("caramel", "1 cup soft caramels (store-bought)"),
            ("popsicle sticks", "4 sticks"),
        ],
    },
    CatalogRecipe {
        name: "Spaghetti",
        description: "Classic pasta with tomato sauce",
        instructions: "1. Cook spaghetti as per packet instructions.
2. In a pan, sauté garlic in olive oil.
3. Add tomatoes, salt, pepper, and herbs. Simmer 10-15 mins.
4. Mix cooked spaghetti. Toss and serve hot.",
        ingredients: &[
            ("spaghetti", "200g"),
            ("tomato", "4 cups (400g) chopped"),
            ("garlic", "2 cloves minced"),
            ("olive oil", "2 tbsp"),
        ],
    },
];
